use crate::chunking::Passage;
use crate::error::{RagError, Result, Service};
use log::info;
use serde::{Deserialize, Serialize};

/// Representation of a vector embedding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Embedding { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Scale to unit length; a zero vector stays zero
    pub fn normalized(mut self) -> Self {
        let norm = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
        self
    }
}

/// Anything that turns text into vectors.
///
/// Implementations return exactly one embedding per input, in input order.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    /// Embed many texts, batching remote calls as the service allows
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a single text (one remote call)
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        match embeddings.pop() {
            Some(embedding) if embeddings.is_empty() => Ok(embedding),
            _ => Err(RagError::remote(
                Service::Embedding,
                "expected exactly one embedding for a single input",
            )),
        }
    }
}

/// Embed all passages and pair them up, checking count and dimension
pub async fn embed_passages<E: Embedder>(
    embedder: &E,
    passages: Vec<Passage>,
) -> Result<Vec<(Embedding, Passage)>> {
    if passages.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    info!("Generating embeddings for {} passages...", texts.len());
    let embeddings = embedder.embed_batch(&texts).await?;

    if embeddings.len() != passages.len() {
        return Err(RagError::remote(
            Service::Embedding,
            format!(
                "requested {} embeddings, received {}",
                passages.len(),
                embeddings.len()
            ),
        ));
    }

    let dimension = embeddings[0].dimension();
    if let Some(bad) = embeddings.iter().find(|e| e.dimension() != dimension) {
        return Err(RagError::remote(
            Service::Embedding,
            format!(
                "inconsistent embedding dimension: {} vs {}",
                bad.dimension(),
                dimension
            ),
        ));
    }

    Ok(embeddings.into_iter().zip(passages).collect())
}
