//! In-memory `CanonicalTagApi` for deterministic session tests
//!
//! No network I/O, so it is safe under `start_paused` time. Search responses
//! can be scripted per query; unscripted queries answer with one match whose
//! canonical form is the query itself. An optional latency keeps requests in
//! flight long enough to be superseded or cancelled.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vlib_common::api::types::{
    CanonicalTagDetail, CanonicalTagListItem, CanonicalTagSearchResponse, PaginationMeta,
};
use vlib_ui::api::CanonicalTagApi;
use vlib_ui::{ApiError, ApiResult};

pub fn list_item(canonical: &str, alias_count: u64, video_count: u64) -> CanonicalTagListItem {
    CanonicalTagListItem {
        canonical_form: canonical.to_string(),
        normalized_form: canonical.to_lowercase(),
        alias_count,
        video_count,
    }
}

pub fn search_response(items: Vec<CanonicalTagListItem>) -> CanonicalTagSearchResponse {
    let total = items.len() as u64;
    CanonicalTagSearchResponse {
        data: items,
        pagination: PaginationMeta {
            total,
            limit: 10,
            offset: 0,
            has_more: false,
        },
        suggestions: Vec::new(),
    }
}

#[derive(Default)]
pub struct MockApi {
    latency: Duration,
    scripted: Mutex<HashMap<String, VecDeque<ApiResult<CanonicalTagSearchResponse>>>>,
    search_calls: Mutex<Vec<String>>,
    cancelled: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a response for the next search of `query`
    pub fn push_search(self, query: &str, result: ApiResult<CanonicalTagSearchResponse>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Queries searched so far, retries included
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Searches aborted by their cancellation token
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanonicalTagApi for MockApi {
    async fn search(
        &self,
        query: &str,
        _limit: usize,
        cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagSearchResponse> {
        self.search_calls.lock().unwrap().push(query.to_string());

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.cancelled.fetch_add(1, Ordering::SeqCst);
                    return Err(ApiError::Cancelled);
                }
                _ = tokio::time::sleep(self.latency) => {}
            }
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(VecDeque::pop_front);

        scripted.unwrap_or_else(|| Ok(search_response(vec![list_item(query, 1, 1)])))
    }

    async fn resolve(
        &self,
        _raw_form: &str,
        _cancel: &CancellationToken,
    ) -> ApiResult<Option<CanonicalTagDetail>> {
        Ok(None)
    }

    async fn detail(
        &self,
        normalized_form: &str,
        _alias_limit: usize,
        _cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagDetail> {
        Err(ApiError::Status {
            status: 404,
            body: format!("{} not found", normalized_form),
        })
    }
}
