//! Throttled client for the code-hosting REST API.

use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::retry::RateLimitPolicy;

/// Timeout for a single request, rate-limit waits excluded.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request; the code-hosting API rejects
/// requests without one.
pub const USER_AGENT: &str = concat!("solcorpus-migrate/", env!("CARGO_PKG_VERSION"));

fn create_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Outcome of a GET that did not hit a connectivity failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 200 with a JSON body.
    Success(serde_json::Value),
    /// Any other status, or a body that could not be read. Carries the
    /// status when there was one.
    Failed(Option<u16>),
}

/// REST client that pauses before every request and waits out rate limits.
pub struct ApiClient {
    client: Client,
    token: Option<String>,
    policy: RateLimitPolicy,
    requests: AtomicU64,
}

impl ApiClient {
    /// Creates a client authenticating with `token` when one is given.
    pub fn new(token: Option<String>, policy: RateLimitPolicy) -> Self {
        Self {
            client: create_http_client(),
            token,
            policy,
            requests: AtomicU64::new(0),
        }
    }

    /// Number of requests sent so far, retries included.
    pub fn requests_issued(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// GETs `url`.
    ///
    /// A 403 is treated as a rate limit: the client sleeps for the interval
    /// given by the response headers and sends the same request again, for
    /// as long as the API keeps answering 403.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] when the host cannot be reached at all.
    pub async fn fetch(&self, url: &str) -> Result<ApiResponse> {
        loop {
            sleep(self.policy.throttle).await;
            self.requests.fetch_add(1, Ordering::Relaxed);

            let mut request = self
                .client
                .get(url)
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if e.is_connect() => {
                    return Err(Error::Network(format!("cannot reach {}: {}", url, e)));
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    return Ok(ApiResponse::Failed(None));
                }
            };

            let status = response.status();
            if status == StatusCode::FORBIDDEN {
                let wait = self.policy.wait_for(response.headers(), SystemTime::now());
                warn!("Rate limit reached, retrying {} in {:?}", url, wait);
                sleep(wait).await;
                continue;
            }

            if status != StatusCode::OK {
                debug!("{} answered {}", url, status);
                return Ok(ApiResponse::Failed(Some(status.as_u16())));
            }

            return match response.json::<serde_json::Value>().await {
                Ok(body) => Ok(ApiResponse::Success(body)),
                Err(e) => {
                    warn!("Unreadable response from {}: {}", url, e);
                    Ok(ApiResponse::Failed(Some(status.as_u16())))
                }
            };
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
