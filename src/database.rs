use crate::chunking::Passage;
use crate::embeddings::Embedding;
use crate::error::{RagError, Result};
use log::debug;

/// An embedded passage held by the index
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub embedding: Embedding,
    pub passage: Passage,
}

impl IndexEntry {
    pub fn new(embedding: Embedding, passage: Passage) -> Self {
        IndexEntry { embedding, passage }
    }
}

/// A retrieved passage with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// The passages retrieved for one query, most similar first
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub query: String,
    pub passages: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub fn empty(query: &str) -> Self {
        RetrievalResult {
            query: query.to_string(),
            passages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }
}

/// In-memory exact nearest-neighbour index over normalized vectors
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

impl VectorIndex {
    /// Build an index from embedded passages, keeping their order
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let mut index = VectorIndex {
            entries: Vec::with_capacity(entries.len()),
            dimension: None,
        };
        for entry in entries {
            index.insert(entry)?;
        }
        debug!(
            "Built index with {} entries (dimension {:?})",
            index.len(),
            index.dimension
        );
        Ok(index)
    }

    /// Append one entry; its dimension must match the rest of the index
    pub fn insert(&mut self, entry: IndexEntry) -> Result<()> {
        let dimension = entry.embedding.dimension();
        match self.dimension {
            Some(expected) if expected != dimension => {
                return Err(RagError::Configuration(format!(
                    "dimension mismatch for {}: index has {}, entry has {}",
                    entry.passage.passage_id, expected, dimension
                )));
            }
            Some(_) => {}
            None => self.dimension = Some(dimension),
        }

        self.entries.push(IndexEntry {
            embedding: entry.embedding.normalized(),
            passage: entry.passage,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of the stored vectors, `None` while the index is empty
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Return up to `k` passages ordered by descending cosine similarity.
    ///
    /// Equal scores keep insertion order. An empty index yields an empty result.
    pub fn search(
        &self,
        query: &str,
        query_embedding: &Embedding,
        k: usize,
    ) -> Result<RetrievalResult> {
        let Some(dimension) = self.dimension else {
            return Ok(RetrievalResult::empty(query));
        };
        if query_embedding.dimension() != dimension {
            return Err(RagError::Configuration(format!(
                "dimension mismatch: index has {}, query has {}",
                dimension,
                query_embedding.dimension()
            )));
        }

        let query_vector = query_embedding.clone().normalized();
        let mut scored: Vec<ScoredPassage> = self
            .entries
            .iter()
            .map(|entry| ScoredPassage {
                score: dot(&entry.embedding.values, &query_vector.values),
                passage: entry.passage.clone(),
            })
            .collect();

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        Ok(RetrievalResult {
            query: query.to_string(),
            passages: scored,
        })
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn passage(id: usize) -> Passage {
        Passage {
            passage_id: format!("doc.txt#{}", id),
            source_id: "doc.txt".to_string(),
            text: format!("passage {}", id),
            start_offset: id * 10,
        }
    }

    fn entry(id: usize, values: Vec<f32>) -> IndexEntry {
        IndexEntry::new(Embedding::new(values), passage(id))
    }

    #[test]
    fn test_empty_index_returns_empty_result() {
        let index = VectorIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        let result = index
            .search("anything", &Embedding::new(vec![1.0, 2.0, 3.0]), 3)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.query, "anything");
    }

    #[test]
    fn test_orders_by_similarity() {
        let index = VectorIndex::build(vec![
            entry(0, vec![0.0, 1.0]),
            entry(1, vec![1.0, 0.0]),
            entry(2, vec![1.0, 1.0]),
        ])
        .unwrap();

        let result = index.search("q", &Embedding::new(vec![2.0, 0.0]), 3).unwrap();
        let ids: Vec<&str> = result
            .passages
            .iter()
            .map(|s| s.passage.passage_id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc.txt#1", "doc.txt#2", "doc.txt#0"]);
        assert!((result.passages[0].score - 1.0).abs() < 1e-6);
        assert!(result.passages[2].score.abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::build(vec![
            entry(0, vec![1.0, 0.0]),
            entry(1, vec![2.0, 0.0]),
            entry(2, vec![3.0, 0.0]),
        ])
        .unwrap();

        let result = index.search("q", &Embedding::new(vec![1.0, 0.0]), 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.passages[0].passage.passage_id, "doc.txt#0");
        assert_eq!(result.passages[1].passage.passage_id, "doc.txt#1");
    }

    #[test]
    fn test_dimension_mismatch_on_build() {
        let err = VectorIndex::build(vec![entry(0, vec![1.0, 0.0]), entry(1, vec![1.0])]);
        assert!(matches!(err, Err(RagError::Configuration(_))));
    }

    #[test]
    fn test_dimension_mismatch_on_search() {
        let index = VectorIndex::build(vec![entry(0, vec![1.0, 0.0])]).unwrap();
        assert!(index.search("q", &Embedding::new(vec![1.0]), 3).is_err());
    }

    #[test]
    fn test_insert_after_build() {
        let mut index = VectorIndex::build(vec![entry(0, vec![0.0, 1.0])]).unwrap();
        index.insert(entry(1, vec![1.0, 0.0])).unwrap();
        assert_eq!(index.len(), 2);
        let result = index.search("q", &Embedding::new(vec![1.0, 0.0]), 1).unwrap();
        assert_eq!(result.passages[0].passage.passage_id, "doc.txt#1");
    }

    proptest! {
        #[test]
        fn prop_search_bounded_and_ordered(
            vectors in proptest::collection::vec(
                proptest::collection::vec(-1.0f32..1.0, 4), 0..20),
            query in proptest::collection::vec(-1.0f32..1.0, 4),
            k in 0usize..25,
        ) {
            let entries = vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| entry(i, v))
                .collect::<Vec<_>>();
            let count = entries.len();
            let index = VectorIndex::build(entries).unwrap();
            let result = index.search("q", &Embedding::new(query), k).unwrap();

            prop_assert!(result.len() <= k);
            prop_assert_eq!(result.len(), k.min(count));
            for pair in result.passages.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].passage.start_offset < pair[1].passage.start_offset);
                }
            }
        }
    }
}
