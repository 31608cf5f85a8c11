//! Error types for `solcorpus-migrate`.
//!
//! Variants are grouped by how the driver reacts to them: connection and
//! network errors end the run, everything raised while handling a single
//! file is logged and the file is skipped.

use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while migrating the catalog.
///
/// Error codes follow the pattern `SOLM-XXX`.
#[derive(Error, Debug)]
pub enum Error {
    /// The SQLite catalog could not be opened (SOLM-001).
    #[error("[SOLM-001] Source connection error: {0}")]
    SourceConnection(String),

    /// The destination store could not be reached (SOLM-002).
    #[error("[SOLM-002] Destination connection error: {0}")]
    DestinationConnection(String),

    /// The local network is unreachable (SOLM-003).
    ///
    /// Raised when an API request cannot reach its host at all. This ends
    /// the run instead of being retried.
    #[error("[SOLM-003] Network unreachable: {0}")]
    Network(String),

    /// Reading rows from the catalog failed (SOLM-004).
    #[error("[SOLM-004] Extraction error: {0}")]
    Extraction(String),

    /// Writing a document to the destination failed (SOLM-005).
    #[error("[SOLM-005] Loading error: {0}")]
    Loading(String),

    /// Invalid configuration (SOLM-006).
    #[error("[SOLM-006] Configuration error: {0}")]
    Config(String),

    /// The destination rejected the credentials in the connection string
    /// (SOLM-007).
    #[error("[SOLM-007] Authentication error: {0}")]
    Authentication(String),

    /// IO error (SOLM-008).
    #[error("[SOLM-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error (SOLM-009).
    #[error("[SOLM-009] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error (SOLM-010).
    #[error("[SOLM-010] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (SOLM-011).
    #[error("[SOLM-011] HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQL error raised while reading the catalog (SOLM-012).
    #[error("[SOLM-012] SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl Error {
    /// Returns the error code (e.g., "SOLM-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SourceConnection(_) => "SOLM-001",
            Self::DestinationConnection(_) => "SOLM-002",
            Self::Network(_) => "SOLM-003",
            Self::Extraction(_) => "SOLM-004",
            Self::Loading(_) => "SOLM-005",
            Self::Config(_) => "SOLM-006",
            Self::Authentication(_) => "SOLM-007",
            Self::Io(_) => "SOLM-008",
            Self::Yaml(_) => "SOLM-009",
            Self::Json(_) => "SOLM-010",
            Self::Http(_) => "SOLM-011",
            Self::Sql(_) => "SOLM-012",
        }
    }

    /// Returns true if this error must stop the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceConnection(_)
                | Self::DestinationConnection(_)
                | Self::Authentication(_)
                | Self::Network(_)
                | Self::Sql(_)
                | Self::Extraction(_)
        )
    }
}
