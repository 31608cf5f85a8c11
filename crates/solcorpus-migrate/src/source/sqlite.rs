//! SQLite catalog reader.
//!
//! Repositories and files are streamed so large catalogs are never loaded in
//! full; the revisions of one file are small enough to collect.

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

use super::{CatalogCounts, FileRow, RepositoryRow, VersionRow};
use crate::error::{Error, Result};

/// One connection for the repository stream, one for the file stream of
/// the current repository and one for revision lookups.
const MAX_CONNECTIONS: u32 = 4;

const REPOSITORIES_QUERY: &str =
    "SELECT id, full_name, description, url, owner_id FROM repo ORDER BY id";

const FILES_QUERY: &str = "SELECT id, name, path, sha FROM file WHERE repo_id = ? ORDER BY id";

const VERSIONS_QUERY: &str = "SELECT sha, \
            COALESCE(message, '') AS message, \
            COALESCE(size, 0) AS size, \
            COALESCE(CAST(created AS TEXT), '') AS created, \
            COALESCE(content, '') AS content, \
            COALESCE(parents, '') AS parents \
     FROM comit WHERE file_id = ? ORDER BY created ASC, rowid ASC";

/// Read-only handle on the crawler's SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Opens the catalog read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceConnection`] if the file does not exist or is
    /// not a SQLite database.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::SourceConnection(format!(
                    "cannot open SQLite catalog {}: {}",
                    path.display(),
                    e
                ))
            })?;

        debug!("Opened SQLite catalog {}", path.display());
        Ok(Self { pool })
    }

    /// Counts rows in the three catalog tables.
    pub async fn counts(&self) -> Result<CatalogCounts> {
        Ok(CatalogCounts {
            repositories: self.count("repo").await?,
            files: self.count("file").await?,
            commits: self.count("comit").await?,
        })
    }

    async fn count(&self, table: &'static str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Streams every repository in identifier order.
    pub fn repositories(&self) -> BoxStream<'_, Result<RepositoryRow>> {
        sqlx::query_as::<_, RepositoryRow>(REPOSITORIES_QUERY)
            .fetch(&self.pool)
            .map_err(|e| Error::Extraction(format!("reading repositories: {}", e)))
            .boxed()
    }

    /// Streams the files of one repository.
    pub fn files(&self, repo_id: i64) -> BoxStream<'_, Result<FileRow>> {
        sqlx::query_as::<_, FileRow>(FILES_QUERY)
            .bind(repo_id)
            .fetch(&self.pool)
            .map_err(move |e| {
                Error::Extraction(format!("reading files of repository {}: {}", repo_id, e))
            })
            .boxed()
    }

    /// Returns the revisions of one file, oldest first.
    ///
    /// Ties on the creation timestamp fall back to insertion order so the
    /// derived `version_id` is identical on every run.
    pub async fn versions(&self, file_id: i64) -> Result<Vec<VersionRow>> {
        let rows = sqlx::query_as::<_, VersionRow>(VERSIONS_QUERY)
            .bind(file_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Extraction(format!("reading versions of file {}: {}", file_id, e))
            })?;
        Ok(rows)
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
