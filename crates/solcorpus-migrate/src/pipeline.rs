//! Migration pipeline orchestration.
//!
//! Repositories are streamed from the catalog one at a time. For each one
//! the optional license check runs first, then every file is turned into a
//! [`Document`] and offered to the sink:
//!
//! ```text
//! repository: PENDING -> LICENSE_CHECK -> SKIPPED | FILE_LOOP -> DONE
//! file:       FETCHED -> EXTENSION_CHECK -> SKIPPED_JSON | BUILD
//!             BUILD -> SKIPPED_EMPTY | DEDUP_CHECK
//!             DEDUP_CHECK -> SKIPPED_DUPLICATE | UPLOADED | FAILED
//! ```

use futures::TryStreamExt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::MigrationConfig;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::license::LicenseClassifier;
use crate::progress::Progress;
use crate::sink::{create_sink, DocumentSink, UploadOutcome};
use crate::source::{FileRow, RepositoryRow, SqliteCatalog};

/// Migration statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationStats {
    /// Repositories in the catalog.
    pub repositories_total: u64,
    /// Files in the catalog.
    pub files_total: u64,
    /// Revisions in the catalog.
    pub commits_total: u64,
    /// Repositories handled, skipped ones included.
    pub repositories: u64,
    /// Repositories skipped for lacking an open-source license.
    pub repositories_skipped: u64,
    /// Files handled.
    pub files: u64,
    /// Revisions read.
    pub commits: u64,
    /// Files skipped because they are JSON artifacts.
    pub skipped_json: u64,
    /// Files skipped because they have no revisions.
    pub skipped_empty: u64,
    /// Files already present in the destination.
    pub duplicates: u64,
    /// Documents inserted.
    pub uploaded: u64,
    /// Documents the destination did not accept.
    pub failed: u64,
    /// Requests sent to the license API.
    pub api_requests: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationStats {
    /// Files skipped before reaching the sink.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped_json + self.skipped_empty
    }

    /// Calculate throughput (files per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.files as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// What happened to a single catalog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Path ends in `.json`; never built.
    SkippedJson,
    /// No revisions; built but not uploaded.
    SkippedEmpty,
    /// Key already present in the destination.
    Duplicate,
    /// Inserted under the given identifier.
    Uploaded(String),
    /// Rejected by the destination.
    Failed(String),
}

/// How a run guarded by [`Pipeline::run_until`] ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every repository was visited.
    Completed,
    /// The shutdown future resolved first; the in-flight file was dropped.
    Interrupted,
    /// A fatal error stopped the traversal.
    Aborted(Error),
}

/// Result of [`Pipeline::run_until`], taken after both stores were closed.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Counters at the moment the run stopped.
    pub stats: MigrationStats,
}

/// Migration pipeline.
pub struct Pipeline {
    source: SqliteCatalog,
    sink: Box<dyn DocumentSink>,
    classifier: Option<LicenseClassifier>,
    progress: Progress,
    stats: MigrationStats,
    started: Option<Instant>,
    license: String,
}

impl Pipeline {
    /// Create a pipeline over already opened parts.
    ///
    /// License checking is enabled by passing a classifier.
    pub fn new(
        source: SqliteCatalog,
        sink: Box<dyn DocumentSink>,
        classifier: Option<LicenseClassifier>,
    ) -> Self {
        Self {
            source,
            sink,
            classifier,
            progress: Progress::hidden(),
            stats: MigrationStats::default(),
            started: None,
            license: String::new(),
        }
    }

    /// Open the catalog and the destination described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceConnection`](crate::Error::SourceConnection) or
    /// [`Error::DestinationConnection`](crate::Error::DestinationConnection)
    /// if either store is unreachable.
    pub async fn from_config(config: &MigrationConfig) -> Result<Self> {
        let source = SqliteCatalog::open(&config.source.path).await?;

        let mut sink = create_sink(config);
        if let Err(e) = sink.connect().await {
            source.close().await;
            return Err(e);
        }

        let classifier = config
            .license
            .enabled
            .then(|| LicenseClassifier::from_config(&config.license));

        Ok(Self::new(source, sink, classifier).with_progress(Progress::new()))
    }

    /// Replace the progress renderer.
    #[must_use]
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Snapshot of the counters, with elapsed time and request count filled
    /// in. Valid at any point, including after an interrupted run.
    pub fn stats(&self) -> MigrationStats {
        let mut stats = self.stats.clone();
        if let Some(classifier) = &self.classifier {
            stats.api_requests = classifier.requests_issued();
        }
        if let Some(started) = self.started {
            stats.duration_secs = started.elapsed().as_secs_f64();
        }
        stats
    }

    /// Run the migration pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the catalog fails or the license API
    /// becomes unreachable. Per-file problems are counted, not returned.
    pub async fn run(&mut self) -> Result<MigrationStats> {
        self.started = Some(Instant::now());

        info!(
            "Starting migration into {} sink{}",
            self.sink.sink_type(),
            if self.classifier.is_some() {
                " with license checks"
            } else {
                ""
            }
        );

        let counts = self.source.counts().await?;
        self.stats.repositories_total = counts.repositories;
        self.stats.files_total = counts.files;
        self.stats.commits_total = counts.commits;
        self.progress.set_total(counts.files);
        info!(
            "Catalog: {} repositories, {} files, {} commits",
            counts.repositories, counts.files, counts.commits
        );

        let source = self.source.clone();
        let mut repositories = source.repositories();
        while let Some(repo) = repositories.try_next().await? {
            let result = self.process_repository(&source, &repo).await;
            self.license.clear();
            result?;
        }

        let stats = self.stats();
        self.progress.finish(&stats);

        info!(
            "Migration complete: {} uploaded, {} duplicates, {} skipped, {} failed in {:.2}s ({:.0} files/sec)",
            stats.uploaded,
            stats.duplicates,
            stats.skipped(),
            stats.failed,
            stats.duration_secs,
            stats.throughput()
        );

        Ok(stats)
    }

    /// Runs the migration until it ends or `shutdown` resolves, then closes
    /// the catalog and the destination.
    ///
    /// Dropping the run at any await point is safe: a document is written
    /// as the last step for its file, so no partial document is uploaded.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.run() => match result {
                Ok(_) => RunOutcome::Completed,
                Err(e) => RunOutcome::Aborted(e),
            },
            () = shutdown => {
                warn!("Interrupted, closing connections");
                RunOutcome::Interrupted
            }
        };

        if let Err(e) = self.shutdown().await {
            warn!("Error while closing connections: {}", e);
        }

        RunReport {
            outcome,
            stats: self.stats(),
        }
    }

    async fn process_repository(
        &mut self,
        source: &SqliteCatalog,
        repo: &RepositoryRow,
    ) -> Result<()> {
        self.stats.repositories += 1;
        debug!("Repository {} ({})", repo.full_name, repo.id);

        if let Some(classifier) = &self.classifier {
            let verdict = classifier.classify(&repo.full_name).await?;
            if !verdict.is_open_source() {
                info!("Skipping {}: no open-source license", repo.full_name);
                self.stats.repositories_skipped += 1;
                self.progress.update(&self.stats);
                return Ok(());
            }
            self.license = verdict.license().to_string();
        }

        let mut files = source.files(repo.id);
        while let Some(file) = files.try_next().await? {
            let outcome = match self.process_file(source, repo, &file).await {
                Ok(outcome) => outcome,
                Err(e) if !e.is_fatal() => {
                    warn!("Skipping {} in {}: {}", file.path, repo.full_name, e);
                    FileOutcome::Failed(e.to_string())
                }
                Err(e) => return Err(e),
            };
            self.record(&outcome);
            self.progress.update(&self.stats);
        }

        Ok(())
    }

    /// Moves one file through the extension, empty and duplicate guards.
    async fn process_file(
        &mut self,
        source: &SqliteCatalog,
        repo: &RepositoryRow,
        file: &FileRow,
    ) -> Result<FileOutcome> {
        self.stats.files += 1;

        if file.is_json() {
            debug!("Skipping JSON artifact {}", file.path);
            return Ok(FileOutcome::SkippedJson);
        }

        let versions = source.versions(file.id).await?;
        self.stats.commits += versions.len() as u64;

        let document = Document::build(repo, file, &versions, &self.license);
        if document.is_empty() {
            debug!("Skipping {} in {}: no versions", file.path, repo.full_name);
            return Ok(FileOutcome::SkippedEmpty);
        }

        Ok(match self.sink.upsert_if_absent(&document).await {
            UploadOutcome::Inserted(id) => FileOutcome::Uploaded(id),
            UploadOutcome::Duplicate => {
                debug!("{} in {} already migrated", file.path, repo.full_name);
                FileOutcome::Duplicate
            }
            UploadOutcome::Failed(reason) => {
                warn!(
                    "Upload of {} in {} failed: {}",
                    file.path, repo.full_name, reason
                );
                FileOutcome::Failed(reason)
            }
        })
    }

    fn record(&mut self, outcome: &FileOutcome) {
        let counter = match outcome {
            FileOutcome::SkippedJson => &mut self.stats.skipped_json,
            FileOutcome::SkippedEmpty => &mut self.stats.skipped_empty,
            FileOutcome::Duplicate => &mut self.stats.duplicates,
            FileOutcome::Uploaded(_) => &mut self.stats.uploaded,
            FileOutcome::Failed(_) => &mut self.stats.failed,
        };
        *counter += 1;
    }

    /// Release the catalog and the destination.
    ///
    /// Safe to call after a completed, failed or interrupted run.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.progress.abandon();
        self.source.close().await;
        self.sink.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_stats_throughput() {
        let stats = MigrationStats {
            files: 1000,
            duration_secs: 2.0,
            ..Default::default()
        };

        assert!((stats.throughput() - 500.0).abs() < 0.001);
    }

    #[test]
    fn test_migration_stats_zero_duration() {
        let stats = MigrationStats::default();
        assert_eq!(stats.throughput(), 0.0);
    }

    #[test]
    fn test_skipped_sums_json_and_empty() {
        let stats = MigrationStats {
            skipped_json: 2,
            skipped_empty: 3,
            duplicates: 4,
            ..Default::default()
        };
        assert_eq!(stats.skipped(), 5);
    }
}
