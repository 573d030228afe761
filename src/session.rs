use crate::database::ScoredPassage;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::rag::{ChatModel, GenerationResult, RagEngine};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Closing turn the assistant adds after every answer
pub const FOLLOW_UP: &str = "Ready for your next question?";

/// Who said a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label shown in front of the turn
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Bot",
        }
    }
}

/// One message of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

impl fmt::Display for ChatTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}:** {}", self.role.label(), self.text)
    }
}

/// Append-only, ordered record of the conversation
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Mutex<Vec<ChatTurn>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn turns(&self) -> MutexGuard<'_, Vec<ChatTurn>> {
        // A poisoned lock still guards a whole vector; push and extend never leave it half-written
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, turn: ChatTurn) {
        self.turns().push(turn);
    }

    /// Append several turns with no other append in between
    pub fn append_all(&self, turns: impl IntoIterator<Item = ChatTurn>) {
        self.turns().extend(turns);
    }

    /// Turns in insertion order; the iterator can be cloned to start over
    pub fn history(&self) -> impl Iterator<Item = ChatTurn> + Clone {
        self.turns().clone().into_iter()
    }

    pub fn len(&self) -> usize {
        self.turns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns().is_empty()
    }
}

/// One interactive session: the shared knowledge base, the model and the
/// conversation so far
pub struct Session<E, L> {
    knowledge: Arc<KnowledgeBase<E>>,
    llm: Arc<L>,
    transcript: Transcript,
    last_sources: Mutex<Vec<ScoredPassage>>,
}

impl<E: Embedder, L: ChatModel> Session<E, L> {
    pub fn new(knowledge: Arc<KnowledgeBase<E>>, llm: Arc<L>) -> Self {
        Session {
            knowledge,
            llm,
            transcript: Transcript::new(),
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Build the index now instead of on the first question
    pub async fn warm_up(&self) -> Result<usize> {
        Ok(self.knowledge.index().await?.len())
    }

    /// Answer a question and record the exchange.
    ///
    /// On failure nothing is added to the transcript.
    pub async fn ask(&self, question: &str) -> Result<GenerationResult> {
        self.set_last_sources(Vec::new());

        let settings = self.knowledge.settings();
        let engine = RagEngine::new(
            self.knowledge.index().await?,
            self.knowledge.embedder(),
            Arc::clone(&self.llm),
            settings.top_k,
            settings.temperature,
        );
        let result = engine.answer(question).await?;

        self.transcript.append_all([
            ChatTurn::user(question),
            ChatTurn::assistant(result.answer.clone()),
            ChatTurn::assistant(FOLLOW_UP),
        ]);
        self.set_last_sources(result.sources.clone());

        Ok(result)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Passages behind the most recent successful answer
    pub fn last_sources(&self) -> Vec<ScoredPassage> {
        self.last_sources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_last_sources(&self, sources: Vec<ScoredPassage>) {
        *self
            .last_sources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sources;
    }
}
