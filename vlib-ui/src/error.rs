//! Error types for vlib-ui
//!
//! A raw tag without a canonical mapping (HTTP 404 on the resolve endpoint)
//! is a valid outcome and never shows up here.

use thiserror::Error;

/// API client error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// HTTP 429; requests are suppressed for `retry_after` seconds
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Request exceeded its time budget
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other non-2xx response
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport failure (connection refused, reset, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected JSON shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request superseded or its owner went away
    #[error("Request cancelled")]
    Cancelled,

    /// Client could not be constructed
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// Coarse classification used for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    Timeout,
    Generic,
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::Status { status: 408, .. } => ErrorKind::Timeout,
            ApiError::Cancelled => ErrorKind::Cancelled,
            ApiError::Status { .. }
            | ApiError::Network(_)
            | ApiError::Decode(_)
            | ApiError::Config(_) => ErrorKind::Generic,
        }
    }

    /// Whether an automatic retry with backoff may succeed
    ///
    /// 429 is excluded: it opens a suppression window instead.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status == 408 || (500..600).contains(status),
            ApiError::RateLimited { .. }
            | ApiError::Decode(_)
            | ApiError::Cancelled
            | ApiError::Config(_) => false,
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout(error.to_string())
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;
