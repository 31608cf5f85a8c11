//! Read side of the migration: the crawler's SQLite catalog.
//!
//! The catalog has three tables. `repo` holds one row per repository, `file`
//! one row per tracked Solidity file and `comit` one row per recorded
//! revision of a file.

pub mod sqlite;

use serde::{Deserialize, Serialize};

pub use sqlite::SqliteCatalog;

/// A repository row from the `repo` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepositoryRow {
    /// Repository identifier.
    pub id: i64,
    /// Full name, e.g. "owner/project".
    pub full_name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Repository URL.
    pub url: Option<String>,
    /// Identifier of the owning account.
    pub owner_id: Option<i64>,
}

/// A file row from the `file` table, projected to the migrated columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRow {
    /// File identifier.
    pub id: i64,
    /// File name.
    pub name: String,
    /// Path inside the repository.
    pub path: String,
    /// Content hash of the current revision.
    pub sha: String,
}

impl FileRow {
    /// Returns true for crawl artifacts that are JSON rather than Solidity.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.path.ends_with(".json")
    }
}

/// A revision row from the `comit` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VersionRow {
    /// Content hash of this revision.
    pub sha: String,
    /// Commit message.
    pub message: String,
    /// Size in bytes.
    pub size: i64,
    /// Creation timestamp as stored by the crawler.
    pub created: String,
    /// Raw source text.
    pub content: String,
    /// Parent commit reference(s).
    pub parents: String,
}

/// Row counts known before the traversal starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    /// Rows in `repo`.
    pub repositories: u64,
    /// Rows in `file`.
    pub files: u64,
    /// Rows in `comit`.
    pub commits: u64,
}
