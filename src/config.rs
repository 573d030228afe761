use crate::error::{RagError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DOCS_DIR: &str = "thai_docs";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Tunable knobs of the pipeline
#[derive(Debug, Clone)]
pub struct RagSettings {
    /// Directory holding the `.txt` sources
    pub docs_dir: PathBuf,
    /// Maximum characters per passage
    pub chunk_size: usize,
    /// Characters shared between consecutive passages
    pub chunk_overlap: usize,
    /// Number of passages retrieved per question
    pub top_k: usize,
    /// Sampling temperature of the completion call
    pub temperature: f32,
    /// Timeout applied to every remote call
    pub request_timeout: Duration,
}

impl Default for RagSettings {
    fn default() -> Self {
        RagSettings {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RagSettings {
    /// Reject combinations the chunker and the completion API cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Configuration(
                "top-k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::Configuration(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        Ok(())
    }
}
