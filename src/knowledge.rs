use crate::chunking::split_documents;
use crate::config::RagSettings;
use crate::database::{IndexEntry, VectorIndex};
use crate::document::load_directory;
use crate::embeddings::{embed_passages, Embedder};
use crate::error::Result;
use log::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Owns the document index and builds it at most once, on first use.
///
/// Concurrent first callers wait on the same build. A failed build leaves
/// the cell empty so a later call may try again.
pub struct KnowledgeBase<E> {
    settings: RagSettings,
    embedder: Arc<E>,
    index: OnceCell<Arc<VectorIndex>>,
}

impl<E: Embedder> KnowledgeBase<E> {
    pub fn new(settings: RagSettings, embedder: Arc<E>) -> Self {
        KnowledgeBase {
            settings,
            embedder,
            index: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn embedder(&self) -> Arc<E> {
        Arc::clone(&self.embedder)
    }

    #[cfg(test)]
    fn is_built(&self) -> bool {
        self.index.initialized()
    }

    /// Get the index, building it on the first call
    pub async fn index(&self) -> Result<Arc<VectorIndex>> {
        self.index
            .get_or_try_init(|| self.build())
            .await
            .cloned()
    }

    /// Load, split and embed the sources, then index them
    async fn build(&self) -> Result<Arc<VectorIndex>> {
        info!(
            "Building index from {}",
            self.settings.docs_dir.display()
        );

        let documents = load_directory(&self.settings.docs_dir)?;
        let passages = split_documents(
            &documents,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        info!(
            "Split {} documents into {} passages",
            documents.len(),
            passages.len()
        );

        let entries = embed_passages(self.embedder.as_ref(), passages)
            .await?
            .into_iter()
            .map(|(embedding, passage)| IndexEntry::new(embedding, passage))
            .collect();
        let index = VectorIndex::build(entries)?;

        info!("Index ready with {} passages", index.len());
        Ok(Arc::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::testing::{BagOfWordsEmbedder, FailingEmbedder};
    use std::fs;
    use tempfile::TempDir;

    fn settings_for(dir: &TempDir) -> RagSettings {
        RagSettings {
            docs_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_builds_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("visa.txt"), "Tourist visas last 60 days.").unwrap();
        let embedder = Arc::new(BagOfWordsEmbedder::default());
        let knowledge = KnowledgeBase::new(settings_for(&dir), embedder.clone());

        assert!(!knowledge.is_built());
        let first = knowledge.index().await.unwrap();
        let second = knowledge.index().await.unwrap();

        assert!(knowledge.is_built());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_builds_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "Songkran is in April.").unwrap();
        let embedder = Arc::new(BagOfWordsEmbedder::default());
        let knowledge = KnowledgeBase::new(settings_for(&dir), embedder.clone());

        let (a, b) = tokio::join!(knowledge.index(), knowledge.index());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_builds_empty_index() {
        let dir = TempDir::new().unwrap();
        let knowledge =
            KnowledgeBase::new(settings_for(&dir), Arc::new(BagOfWordsEmbedder::default()));
        assert!(knowledge.index().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_is_not_cached() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "Some text.").unwrap();
        let knowledge = KnowledgeBase::new(settings_for(&dir), Arc::new(FailingEmbedder::unavailable()));

        assert!(matches!(
            knowledge.index().await,
            Err(RagError::RemoteService { .. })
        ));
        assert!(!knowledge.is_built());
    }

    #[tokio::test]
    async fn test_rebuild_gives_identical_results() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("visa.txt"), "Tourist visas last 60 days.").unwrap();
        fs::write(dir.path().join("bank.txt"), "Banks need a work permit.").unwrap();

        let query = BagOfWordsEmbedder::vector("tourist visa");
        let mut results = Vec::new();
        for _ in 0..2 {
            let knowledge =
                KnowledgeBase::new(settings_for(&dir), Arc::new(BagOfWordsEmbedder::default()));
            let index = knowledge.index().await.unwrap();
            results.push(index.search("tourist visa", &query, 3).unwrap());
        }
        assert_eq!(results[0], results[1]);
    }
}
