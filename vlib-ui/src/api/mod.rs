//! HTTP access to the video library REST API
//!
//! `CanonicalTagApi` is the seam the tag resolver and search session depend
//! on; `ApiClient` is the reqwest implementation.

pub mod cache;
pub mod client;
pub mod retry;

pub use cache::{Fetched, ResponseCache};
pub use client::{ApiClient, ClientSettings};
pub use retry::{parse_retry_after, RetryPolicy, DEFAULT_RETRY_AFTER_SECS};

use crate::error::ApiResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vlib_common::api::types::{CanonicalTagDetail, CanonicalTagSearchResponse};

/// Canonical tag endpoints
///
/// Every call takes a cancellation token; a cancelled call returns
/// `ApiError::Cancelled` without waiting for the response.
#[async_trait]
pub trait CanonicalTagApi: Send + Sync {
    /// `GET /canonical-tags?q=<prefix>&limit=<n>`
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagSearchResponse>;

    /// `GET /canonical-tags/resolve?raw_form=<tag>`
    ///
    /// `Ok(None)` means the raw tag has no canonical mapping (404).
    async fn resolve(
        &self,
        raw_form: &str,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<CanonicalTagDetail>>;

    /// `GET /canonical-tags/<normalized_form>?alias_limit=<n>`
    async fn detail(
        &self,
        normalized_form: &str,
        alias_limit: usize,
        cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagDetail>;

    /// Resolution already known without network I/O
    ///
    /// Outer `None`: not cached. `Some(None)`: cached as orphan.
    async fn cached_resolution(&self, _raw_form: &str) -> Option<Option<CanonicalTagDetail>> {
        None
    }
}
