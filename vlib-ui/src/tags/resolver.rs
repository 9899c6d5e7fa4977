//! Raw tag → canonical tag resolution
//!
//! One `GET /canonical-tags/resolve` per distinct raw tag, issued
//! concurrently and joined before anything is grouped. A 404 is a valid
//! outcome (orphan); any other failure is isolated to its own tag.

use super::grouping::{group_entries, TagGrouping};
use super::ResolvedTagEntry;
use crate::api::{CanonicalTagApi, RetryPolicy};
use crate::error::ApiError;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolves raw tag lists against the canonical tag API
pub struct TagResolver {
    api: Arc<dyn CanonicalTagApi>,
    retry: RetryPolicy,
}

impl TagResolver {
    pub fn new(api: Arc<dyn CanonicalTagApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Input as an ordered set: first-seen order, blank tags skipped
    pub fn distinct_tags(raw_tags: &[String]) -> Vec<&str> {
        let mut seen = HashSet::new();
        raw_tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !tag.trim().is_empty())
            .filter(|tag| seen.insert(*tag))
            .collect()
    }

    /// Resolve every distinct raw tag and wait for all of them to settle
    ///
    /// Each request runs under a child of `cancel`. Entries whose request
    /// was cancelled stay `is_loading`, so a cancelled batch never classifies
    /// as ready.
    pub async fn resolve_all(
        &self,
        raw_tags: &[String],
        cancel: &CancellationToken,
    ) -> Vec<ResolvedTagEntry> {
        let tags = Self::distinct_tags(raw_tags);
        debug!(count = tags.len(), "Resolving raw tags");

        let requests = tags
            .iter()
            .map(|tag| self.resolve_one(tag, cancel.child_token()));
        let entries = join_all(requests).await;

        let resolved = entries.iter().filter(|e| e.canonical.is_some()).count();
        let orphans = entries.iter().filter(|e| e.is_orphan()).count();
        let failed = entries.iter().filter(|e| e.error.is_some()).count();
        info!(resolved, orphans, failed, "Tag resolution settled");

        entries
    }

    async fn resolve_one(&self, raw_tag: &str, cancel: CancellationToken) -> ResolvedTagEntry {
        let api: &dyn CanonicalTagApi = self.api.as_ref();
        let token = &cancel;

        let result = self
            .retry
            .run(token, "Tag resolution", move || api.resolve(raw_tag, token))
            .await;

        match result {
            Ok(Some(detail)) => ResolvedTagEntry::resolved(raw_tag, detail.to_list_item()),
            Ok(None) => {
                debug!(raw_tag = %raw_tag, "No canonical mapping");
                ResolvedTagEntry::orphan(raw_tag)
            }
            Err(ApiError::Cancelled) => {
                debug!(raw_tag = %raw_tag, "Tag resolution cancelled");
                ResolvedTagEntry::loading(raw_tag)
            }
            Err(error) => {
                warn!(raw_tag = %raw_tag, "Tag resolution failed: {}", error);
                ResolvedTagEntry::failed(raw_tag, error.to_string())
            }
        }
    }

    /// Current view without network I/O
    ///
    /// Tags whose resolution is cached are settled; the rest are loading.
    pub async fn snapshot(&self, raw_tags: &[String]) -> Vec<ResolvedTagEntry> {
        let mut entries = Vec::new();
        for tag in Self::distinct_tags(raw_tags) {
            let entry = match self.api.cached_resolution(tag).await {
                Some(Some(detail)) => ResolvedTagEntry::resolved(tag, detail.to_list_item()),
                Some(None) => ResolvedTagEntry::orphan(tag),
                None => ResolvedTagEntry::loading(tag),
            };
            entries.push(entry);
        }
        entries
    }
}

/// What the tag section renders for a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// At least one tag unsettled; the whole section shows loading
    Loading,
    /// Nothing to show
    Empty,
    Ready(TagGrouping),
}

pub fn classify(entries: &[ResolvedTagEntry]) -> Classification {
    if entries.iter().any(|e| e.is_loading) {
        return Classification::Loading;
    }

    let grouping = group_entries(entries);
    if grouping.is_empty() {
        Classification::Empty
    } else {
        Classification::Ready(grouping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vlib_common::api::types::{CanonicalTagDetail, CanonicalTagSearchResponse};

    /// Answers from a fixed table; unknown tags are 404
    #[derive(Default)]
    struct TableApi {
        table: HashMap<String, ApiResult<CanonicalTagDetail>>,
        calls: Mutex<Vec<String>>,
    }

    impl TableApi {
        fn with(mut self, raw: &str, result: ApiResult<CanonicalTagDetail>) -> Self {
            self.table.insert(raw.to_string(), result);
            self
        }
    }

    fn detail(canonical: &str, normalized: &str, aliases: u64) -> CanonicalTagDetail {
        CanonicalTagDetail {
            canonical_form: canonical.to_string(),
            normalized_form: normalized.to_string(),
            alias_count: aliases,
            video_count: 1,
            top_aliases: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[async_trait]
    impl CanonicalTagApi for TableApi {
        async fn search(
            &self,
            _query: &str,
            _limit: usize,
            _cancel: &CancellationToken,
        ) -> ApiResult<CanonicalTagSearchResponse> {
            Ok(CanonicalTagSearchResponse::default())
        }

        async fn resolve(
            &self,
            raw_form: &str,
            _cancel: &CancellationToken,
        ) -> ApiResult<Option<CanonicalTagDetail>> {
            self.calls.lock().unwrap().push(raw_form.to_string());
            match self.table.get(raw_form) {
                Some(result) => result.clone().map(Some),
                None => Ok(None),
            }
        }

        async fn detail(
            &self,
            normalized_form: &str,
            _alias_limit: usize,
            _cancel: &CancellationToken,
        ) -> ApiResult<CanonicalTagDetail> {
            Err(ApiError::Status {
                status: 404,
                body: normalized_form.to_string(),
            })
        }
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_distinct_tags_keep_first_seen_order() {
        let input = tags(&["b", "a", "", "b", "  ", "c", "a"]);
        assert_eq!(TagResolver::distinct_tags(&input), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_one_request_per_distinct_tag() {
        let api = Arc::new(TableApi::default().with("rust", Ok(detail("Rust", "rust", 2))));
        let resolver = TagResolver::new(api.clone(), RetryPolicy::none());

        let entries = resolver
            .resolve_all(&tags(&["rust", "rust", "unknown"]), &CancellationToken::new())
            .await;

        assert_eq!(entries.len(), 2);
        let mut calls = api.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["rust", "unknown"]);
    }

    #[tokio::test]
    async fn test_failure_isolated_from_siblings() {
        let api = Arc::new(
            TableApi::default()
                .with("ok", Ok(detail("OK", "ok", 1)))
                .with(
                    "broken",
                    Err(ApiError::Status {
                        status: 500,
                        body: "boom".to_string(),
                    }),
                ),
        );
        let resolver = TagResolver::new(api, RetryPolicy::none());

        let entries = resolver
            .resolve_all(&tags(&["ok", "broken", "lost"]), &CancellationToken::new())
            .await;

        assert!(entries[0].canonical.is_some());
        assert!(entries[1].error.is_some());
        assert!(entries[2].is_orphan());

        match classify(&entries) {
            Classification::Ready(grouping) => {
                assert_eq!(grouping.groups.len(), 1);
                assert_eq!(grouping.orphans, vec!["lost"]);
                assert_eq!(grouping.failed, vec!["broken"]);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_batch_stays_loading() {
        let resolver = TagResolver::new(Arc::new(TableApi::default()), RetryPolicy::none());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let entries = resolver.resolve_all(&tags(&["a"]), &cancel).await;
        assert_eq!(classify(&entries), Classification::Loading);
    }

    #[tokio::test]
    async fn test_snapshot_without_cache_is_loading() {
        let resolver = TagResolver::new(Arc::new(TableApi::default()), RetryPolicy::none());
        let entries = resolver.snapshot(&tags(&["a", "b"])).await;

        assert!(entries.iter().all(|e| e.is_loading));
        assert_eq!(classify(&entries), Classification::Loading);
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify(&[]), Classification::Empty);
    }

    #[test]
    fn test_any_loading_entry_hides_partial_view() {
        let entries = vec![
            ResolvedTagEntry::orphan("a"),
            ResolvedTagEntry::loading("b"),
        ];
        assert_eq!(classify(&entries), Classification::Loading);
    }
}
