//! Destination sinks.
//!
//! A sink stores [`Document`]s keyed by (repository id, file sha). The
//! pipeline only ever calls [`DocumentSink::upsert_if_absent`], which makes a
//! second run over the same catalog a no-op.

pub mod memory;
pub mod mongodb;

use async_trait::async_trait;
use tracing::warn;

use crate::config::MigrationConfig;
use crate::document::Document;
use crate::error::Result;

pub use memory::MemorySink;
pub use mongodb::MongoSink;

/// Result of offering one document to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored under the returned identifier.
    Inserted(String),
    /// A document with the same key already exists; nothing was written.
    Duplicate,
    /// The write did not happen; the file is skipped.
    Failed(String),
}

/// Trait for destination stores.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Get the sink type name.
    fn sink_type(&self) -> &'static str;

    /// Verify the destination is reachable.
    async fn connect(&mut self) -> Result<()>;

    /// Returns true if a document with this key exists.
    async fn exists(&self, repo_id: i64, sha: &str) -> Result<bool>;

    /// Inserts a document, returning the generated identifier if the store
    /// reported one.
    async fn insert(&self, document: &Document) -> Result<Option<String>>;

    /// Inserts `document` unless its key is already present.
    ///
    /// Store errors are reported as [`UploadOutcome::Failed`] so the caller
    /// can move on to the next file.
    async fn upsert_if_absent(&self, document: &Document) -> UploadOutcome {
        let (repo_id, sha) = document.key();

        match self.exists(repo_id, sha).await {
            Ok(true) => return UploadOutcome::Duplicate,
            Ok(false) => {}
            Err(e) => {
                warn!("Duplicate lookup for {}/{} failed: {}", repo_id, sha, e);
                return UploadOutcome::Failed(e.to_string());
            }
        }

        match self.insert(document).await {
            Ok(Some(id)) => UploadOutcome::Inserted(id),
            Ok(None) => {
                warn!("Insert of {}/{} returned no identifier", repo_id, sha);
                UploadOutcome::Failed("no inserted id returned".to_string())
            }
            Err(e) => {
                warn!("Insert of {}/{} failed: {}", repo_id, sha, e);
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Release the destination handle.
    async fn close(&mut self) -> Result<()>;
}

/// Create the sink described by the configuration.
///
/// Dry runs get a [`MemorySink`] so deduplication still applies but nothing
/// leaves the machine.
pub fn create_sink(config: &MigrationConfig) -> Box<dyn DocumentSink> {
    if config.options.dry_run {
        Box::new(MemorySink::new())
    } else {
        Box::new(MongoSink::new(config.destination.clone()))
    }
}
