use crate::embeddings::{Embedder, Embedding};
use crate::error::{RagError, Result, Service};
use crate::rag::ChatModel;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const BAG_DIMENSION: usize = 256;

/// Hashes lowercase words into a fixed number of buckets
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn vector(text: &str) -> Embedding {
        let mut values = vec![0.0; BAG_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            values[(hash % BAG_DIMENSION as u64) as usize] += 1.0;
        }
        Embedding::new(values)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for BagOfWordsEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Always fails, either with a timeout or a plain service error
pub struct FailingEmbedder {
    timed_out: bool,
}

impl FailingEmbedder {
    pub fn timeout() -> Self {
        FailingEmbedder { timed_out: true }
    }

    pub fn unavailable() -> Self {
        FailingEmbedder { timed_out: false }
    }
}

impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embedding>> {
        if self.timed_out {
            Err(RagError::timeout(Service::Embedding))
        } else {
            Err(RagError::remote(Service::Embedding, "503 Service Unavailable"))
        }
    }
}

/// Answers like `BagOfWordsEmbedder` for the first `successes` calls, then times out
pub struct TimingOutEmbedder {
    successes: usize,
    calls: AtomicUsize,
}

impl TimingOutEmbedder {
    pub fn after(successes: usize) -> Self {
        TimingOutEmbedder {
            successes,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for TimingOutEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.successes {
            return Err(RagError::timeout(Service::Embedding));
        }
        Ok(texts.iter().map(|t| BagOfWordsEmbedder::vector(t)).collect())
    }
}

/// Returns a fixed answer and records every prompt it was given
pub struct RecordingChatModel {
    answer: String,
    fail: bool,
    pub prompts: Mutex<Vec<(String, f32)>>,
}

impl RecordingChatModel {
    pub fn answering(answer: &str) -> Self {
        RecordingChatModel {
            answer: answer.to_string(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        RecordingChatModel {
            answer: String::new(),
            fail: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|(p, _)| p.clone())
    }
}

impl ChatModel for RecordingChatModel {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        if self.fail {
            Err(RagError::remote(Service::Completion, "model overloaded"))
        } else {
            Ok(self.answer.clone())
        }
    }
}
