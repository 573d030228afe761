use crate::database::{RetrievalResult, ScoredPassage, VectorIndex};
use crate::embeddings::Embedder;
use crate::error::Result;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

/// Instruction placed in front of every prompt
pub const INSTRUCTION_PREFIX: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// A hosted model that completes a single prompt, with no memory between calls
#[allow(async_fn_in_trait)]
pub trait ChatModel {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Stages a single question moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Embedding,
    Retrieving,
    Generating,
    Done,
    Error,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryState::Idle => "idle",
            QueryState::Embedding => "embedding",
            QueryState::Retrieving => "retrieving",
            QueryState::Generating => "generating",
            QueryState::Done => "done",
            QueryState::Error => "error",
        };
        f.write_str(name)
    }
}

/// The answer to one question and the passages it was based on
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub answer: String,
    /// Retrieved passages, most similar first
    pub sources: Vec<ScoredPassage>,
    /// The exact prompt sent to the model
    pub prompt: String,
}

/// Assemble the prompt: instruction, tagged passages in retrieval order, question
pub fn build_prompt(question: &str, retrieval: &RetrievalResult) -> String {
    let mut prompt = String::from(INSTRUCTION_PREFIX);
    prompt.push_str("\n\n");

    if !retrieval.is_empty() {
        let context = retrieval
            .passages
            .iter()
            .map(|scored| {
                format!(
                    "[source: {}]\n{}",
                    scored.passage.source_id, scored.passage.text
                )
            })
            .collect::<Vec<String>>()
            .join("\n\n");
        prompt.push_str(&context);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt.push_str("\nHelpful Answer:");
    prompt
}

/// RAG (Retrieval-Augmented Generation) engine.
///
/// Holds only shared, read-only state, so one engine can serve any number of
/// questions without them affecting each other.
pub struct RagEngine<E, L> {
    index: Arc<VectorIndex>,
    embedder: Arc<E>,
    llm: Arc<L>,
    top_k: usize,
    temperature: f32,
}

impl<E: Embedder, L: ChatModel> RagEngine<E, L> {
    /// Create a new RAG engine
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<E>,
        llm: Arc<L>,
        top_k: usize,
        temperature: f32,
    ) -> Self {
        RagEngine {
            index,
            embedder,
            llm,
            top_k,
            temperature,
        }
    }

    /// Embed the question and fetch the closest passages
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let mut state = QueryState::Idle;
        let retrieval = self.retrieve_tracked(question, &mut state).await;
        if retrieval.is_err() {
            transition(&mut state, QueryState::Error);
        }
        retrieval
    }

    /// Answer a question from the indexed passages
    pub async fn answer(&self, question: &str) -> Result<GenerationResult> {
        let mut state = QueryState::Idle;
        match self.answer_tracked(question, &mut state).await {
            Ok(result) => {
                transition(&mut state, QueryState::Done);
                Ok(result)
            }
            Err(err) => {
                warn!("Query failed while {}: {}", state, err);
                transition(&mut state, QueryState::Error);
                Err(err)
            }
        }
    }

    async fn retrieve_tracked(
        &self,
        question: &str,
        state: &mut QueryState,
    ) -> Result<RetrievalResult> {
        transition(state, QueryState::Embedding);
        let question_embedding = self.embedder.embed(question).await?;

        transition(state, QueryState::Retrieving);
        self.index.search(question, &question_embedding, self.top_k)
    }

    async fn answer_tracked(
        &self,
        question: &str,
        state: &mut QueryState,
    ) -> Result<GenerationResult> {
        let retrieval = self.retrieve_tracked(question, state).await?;
        if retrieval.is_empty() {
            info!("No relevant passages found, answering from the question alone");
        }

        transition(state, QueryState::Generating);
        let prompt = build_prompt(question, &retrieval);
        let answer = self.llm.complete(&prompt, self.temperature).await?;

        Ok(GenerationResult {
            answer: answer.trim().to_string(),
            sources: retrieval.passages,
            prompt,
        })
    }
}

fn transition(state: &mut QueryState, next: QueryState) {
    debug!("Query state: {} -> {}", state, next);
    *state = next;
}
