//! Retry with exponential backoff and `Retry-After` parsing
//!
//! Transient failures (transport errors, timeouts, 408, 5xx) are retried up
//! to a fixed attempt cap. A 429 is never retried here: the caller opens a
//! suppression window of `Retry-After` seconds instead.

use crate::error::{ApiError, ApiResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use vlib_common::config::ClientConfig;

/// Suppression window used when `Retry-After` is absent or not a number
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 10;

/// Parse a `Retry-After` header value given in seconds
///
/// HTTP-date values are not supported and fall back to the default.
///
/// # Examples
///
/// ```
/// use vlib_ui::api::retry::parse_retry_after;
///
/// assert_eq!(parse_retry_after(Some("30")), 30);
/// assert_eq!(parse_retry_after(Some("soon")), 10);
/// assert_eq!(parse_retry_after(None), 10);
/// ```
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; doubles per further failure
    pub base_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// Cancellation aborts both the pending backoff and further attempts.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        label: &str,
        mut operation: F,
    ) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let backoff = self.backoff_delay(attempt);
                    warn!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        label, attempt, max_attempts, error, backoff
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
