//! Rate-limit handling for the code-hosting API.
//!
//! Requests are throttled proactively with a fixed pause. When the API still
//! answers 403, the wait before repeating the request is taken from the
//! response headers. There is no attempt cap: an incomplete migration is
//! worse than a slow one.

use reqwest::header::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Absolute reset time, in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Relative wait, in seconds.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Throttle and rate-limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Pause before every request.
    pub throttle: Duration,
    /// Wait used when a rate-limit response carries no usable header.
    pub default_retry_after: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(720),
            default_retry_after: Duration::from_secs(60),
        }
    }
}

impl RateLimitPolicy {
    /// Creates a policy with no throttle and no fallback wait.
    pub fn immediate() -> Self {
        Self {
            throttle: Duration::ZERO,
            default_retry_after: Duration::ZERO,
        }
    }

    /// Computes how long to wait after a rate-limit response.
    ///
    /// `x-ratelimit-reset` wins when present: the wait is the time left until
    /// the reset, or zero if it already passed. Otherwise `retry-after` is
    /// used, and [`default_retry_after`](Self::default_retry_after) if that is
    /// missing as well.
    pub fn wait_for(&self, headers: &HeaderMap, now: SystemTime) -> Duration {
        if let Some(reset) = header_u64(headers, RATE_LIMIT_RESET_HEADER) {
            let now_secs = now
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            return Duration::from_secs(reset.saturating_sub(now_secs));
        }

        header_u64(headers, RETRY_AFTER_HEADER)
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after)
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
