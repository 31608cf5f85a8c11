//! In-process sink.
//!
//! Backs `--dry-run`: documents are kept in memory with the same
//! deduplication rule as the real destination. Clones share storage.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::document::Document;
use crate::error::Result;
use crate::sink::DocumentSink;

/// Sink holding documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: Arc<Mutex<Vec<Document>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Document>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the stored documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().clone()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    fn sink_type(&self) -> &'static str {
        "memory"
    }

    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, repo_id: i64, sha: &str) -> Result<bool> {
        Ok(self.lock().iter().any(|doc| doc.key() == (repo_id, sha)))
    }

    async fn insert(&self, document: &Document) -> Result<Option<String>> {
        let mut documents = self.lock();
        documents.push(document.clone());
        Ok(Some(format!("memory-{}", documents.len())))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RepoInfo;
    use crate::sink::UploadOutcome;

    fn doc(repo_id: i64, sha: &str) -> Document {
        Document {
            name: "A.sol".to_string(),
            path: "A.sol".to_string(),
            sha: sha.to_string(),
            language: "Solidity".to_string(),
            license: String::new(),
            repo: RepoInfo {
                repo_id,
                full_name: format!("owner/repo{repo_id}"),
                description: None,
                url: None,
                owner_id: None,
            },
            versions: vec![],
        }
    }

    #[tokio::test]
    async fn test_memory_sink_dedups_on_pair() {
        let sink = MemorySink::new();

        assert_eq!(
            sink.upsert_if_absent(&doc(1, "abc")).await,
            UploadOutcome::Inserted("memory-1".to_string())
        );
        assert_eq!(
            sink.upsert_if_absent(&doc(1, "abc")).await,
            UploadOutcome::Duplicate
        );
        // Same sha in another repository is a different document
        assert_eq!(
            sink.upsert_if_absent(&doc(2, "abc")).await,
            UploadOutcome::Inserted("memory-2".to_string())
        );
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_sink_clones_share_storage() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.insert(&doc(1, "abc")).await.unwrap();

        assert_eq!(handle.len(), 1);
        assert!(handle.exists(1, "abc").await.unwrap());
        assert_eq!(handle.documents()[0].sha, "abc");
    }
}
