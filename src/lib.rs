pub mod chunking;
pub mod config;
pub mod database;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod form;
pub mod knowledge;
pub mod openai;
pub mod rag;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{RagError, Result};
