//! Open-source license classification.

use tracing::{debug, info};

use super::client::{ApiClient, ApiResponse};
use crate::config::LicenseConfig;
use crate::error::Result;
use crate::retry::RateLimitPolicy;

/// License keys accepted as open source.
pub const OPEN_SOURCE_LICENSES: [&str; 13] = [
    "apache-2.0",
    "agpl-3.0",
    "bsd-2-clause",
    "bsd-3-clause",
    "bsl-1.0",
    "cc0-1.0",
    "epl-2.0",
    "gpl-2.0",
    "gpl-3.0",
    "lgpl-2.1",
    "mit",
    "mpl-2.0",
    "unlicense",
];

/// Classification of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseVerdict {
    /// Licensed under the contained allow-listed key.
    OpenSource(String),
    /// No license, a license outside the allow-list, or the lookup failed.
    NotOpenSource,
}

impl LicenseVerdict {
    /// Returns true for [`LicenseVerdict::OpenSource`].
    #[must_use]
    pub fn is_open_source(&self) -> bool {
        matches!(self, Self::OpenSource(_))
    }

    /// The license key to record on documents; empty when not open source.
    #[must_use]
    pub fn license(&self) -> &str {
        match self {
            Self::OpenSource(key) => key,
            Self::NotOpenSource => "",
        }
    }
}

/// Decides whether a repository is open source by asking the API.
pub struct LicenseClassifier {
    client: ApiClient,
    api_url: String,
}

impl LicenseClassifier {
    /// Creates a classifier over an existing client.
    pub fn new(client: ApiClient, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Creates a classifier from configuration.
    pub fn from_config(config: &LicenseConfig) -> Self {
        let policy = RateLimitPolicy {
            throttle: config.throttle(),
            default_retry_after: config.default_retry_after(),
        };
        Self::new(
            ApiClient::new(config.token.clone(), policy),
            config.api_url.clone(),
        )
    }

    /// Number of API requests sent so far.
    pub fn requests_issued(&self) -> u64 {
        self.client.requests_issued()
    }

    fn repository_url(&self, full_name: &str) -> String {
        format!("{}/repos/{}", self.api_url.trim_end_matches('/'), full_name)
    }

    /// Classifies the repository `full_name` ("owner/project").
    ///
    /// # Errors
    ///
    /// Only connectivity failures are errors; every other failed lookup is
    /// [`LicenseVerdict::NotOpenSource`].
    pub async fn classify(&self, full_name: &str) -> Result<LicenseVerdict> {
        let body = match self.client.fetch(&self.repository_url(full_name)).await? {
            ApiResponse::Success(body) => body,
            ApiResponse::Failed(status) => {
                info!(
                    "Cannot verify license of {} (status {:?}), assuming not open source",
                    full_name, status
                );
                return Ok(LicenseVerdict::NotOpenSource);
            }
        };

        let verdict = match license_key(&body) {
            Some(key) if OPEN_SOURCE_LICENSES.contains(&key) => {
                LicenseVerdict::OpenSource(key.to_string())
            }
            _ => LicenseVerdict::NotOpenSource,
        };
        debug!("License of {}: {:?}", full_name, verdict);
        Ok(verdict)
    }

    /// Convenience wrapper over [`classify`](Self::classify).
    pub async fn is_open_source(&self, full_name: &str) -> Result<bool> {
        Ok(self.classify(full_name).await?.is_open_source())
    }
}

fn license_key(body: &serde_json::Value) -> Option<&str> {
    body.get("license")?.get("key")?.as_str()
}
