//! reqwest client for the video library REST API
//!
//! # API Reference
//! - `GET /canonical-tags?q=<prefix>&limit=<n>` → search results + suggestions
//! - `GET /canonical-tags/resolve?raw_form=<tag>` → detail, or 404 for orphans
//! - `GET /canonical-tags/<normalized_form>?alias_limit=<n>` → `{data: detail}`
//! - `GET /categories`, `GET /topics/hierarchy` → lookup lists
//!
//! 429 responses carry a `Retry-After` header in seconds.

use super::cache::{Fetched, ResponseCache};
use super::retry::parse_retry_after;
use super::CanonicalTagApi;
use crate::error::{ApiError, ApiResult};
use crate::filters::Lookups;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vlib_common::api::types::{
    CanonicalTagDetail, CanonicalTagSearchResponse, Category, DataEnvelope, TopicNode,
};
use vlib_common::config::{get_user_agent, ClientConfig};

/// Connection settings for `ApiClient`
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL without trailing slash (e.g. `http://127.0.0.1:8000/api/v1`)
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Response cache staleness bound; zero disables caching
    pub cache_ttl: Duration,
}

impl ClientSettings {
    /// Settings with compiled defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(base_url, &ClientConfig::default())
    }

    pub fn from_config(base_url: impl Into<String>, config: &ClientConfig) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent.clone().unwrap_or_else(|| {
                get_user_agent(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            }),
            cache_ttl: config.cache_ttl(),
        }
    }
}

/// REST API client with a shared response cache
pub struct ApiClient {
    http: Client,
    base_url: String,
    cache: ResponseCache,
}

impl ApiClient {
    pub fn new(settings: ClientSettings) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url,
            cache: ResponseCache::new(settings.cache_ttl),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn search_path(query: &str, limit: usize) -> String {
        format!(
            "/canonical-tags?q={}&limit={}",
            urlencoding::encode(query),
            limit
        )
    }

    fn resolve_path(raw_form: &str) -> String {
        format!(
            "/canonical-tags/resolve?raw_form={}",
            urlencoding::encode(raw_form)
        )
    }

    fn detail_path(normalized_form: &str, alias_limit: usize) -> String {
        format!(
            "/canonical-tags/{}?alias_limit={}",
            urlencoding::encode(normalized_form),
            alias_limit
        )
    }

    /// GET `path` relative to the base URL, through the response cache
    ///
    /// 404 is returned as `Fetched::NotFound`; 429 and every other non-2xx
    /// status are errors.
    async fn get(&self, path: &str, cancel: &CancellationToken) -> ApiResult<Fetched> {
        if let Some(hit) = self.cache.get(path).await {
            return Ok(hit);
        }

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = self.http.get(&url).send() => result.map_err(ApiError::from_reqwest)?,
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Not found");
            self.cache.insert(path.to_string(), Fetched::NotFound).await;
            return Ok(Fetched::NotFound);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            warn!(url = %url, retry_after, "Rate limited by API");
            return Err(ApiError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = response.text() => result.map_err(ApiError::from_reqwest)?,
        };

        self.cache
            .insert(path.to_string(), Fetched::Body(body.clone()))
            .await;
        Ok(Fetched::Body(body))
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &str) -> ApiResult<T> {
        serde_json::from_str(body)
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    /// GET that treats 404 as an error
    async fn get_required<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> ApiResult<T> {
        match self.get(path, cancel).await? {
            Fetched::Body(body) => Self::decode(path, &body),
            Fetched::NotFound => Err(ApiError::Status {
                status: 404,
                body: format!("{} not found", path),
            }),
        }
    }

    /// `GET /categories`
    pub async fn categories(&self, cancel: &CancellationToken) -> ApiResult<Vec<Category>> {
        self.get_required::<DataEnvelope<Vec<Category>>>("/categories", cancel)
            .await
            .map(DataEnvelope::into_inner)
    }

    /// `GET /topics/hierarchy`
    pub async fn topic_hierarchy(&self, cancel: &CancellationToken) -> ApiResult<Vec<TopicNode>> {
        self.get_required::<DataEnvelope<Vec<TopicNode>>>("/topics/hierarchy", cancel)
            .await
            .map(DataEnvelope::into_inner)
    }

    /// Categories and topic tree for filter labels, fetched concurrently
    pub async fn load_lookups(&self, cancel: &CancellationToken) -> ApiResult<Lookups> {
        let (categories, topics) =
            tokio::try_join!(self.categories(cancel), self.topic_hierarchy(cancel))?;
        debug!(
            categories = categories.len(),
            topics = topics.len(),
            "Loaded filter lookups"
        );
        Ok(Lookups::new(&categories, &topics))
    }
}

#[async_trait]
impl CanonicalTagApi for ApiClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagSearchResponse> {
        let path = Self::search_path(query, limit);
        self.get_required(&path, cancel).await
    }

    async fn resolve(
        &self,
        raw_form: &str,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<CanonicalTagDetail>> {
        let path = Self::resolve_path(raw_form);
        match self.get(&path, cancel).await? {
            Fetched::NotFound => Ok(None),
            Fetched::Body(body) => Self::decode::<DataEnvelope<CanonicalTagDetail>>(&path, &body)
                .map(|envelope| Some(envelope.into_inner())),
        }
    }

    async fn detail(
        &self,
        normalized_form: &str,
        alias_limit: usize,
        cancel: &CancellationToken,
    ) -> ApiResult<CanonicalTagDetail> {
        let path = Self::detail_path(normalized_form, alias_limit);
        self.get_required::<DataEnvelope<CanonicalTagDetail>>(&path, cancel)
            .await
            .map(DataEnvelope::into_inner)
    }

    async fn cached_resolution(&self, raw_form: &str) -> Option<Option<CanonicalTagDetail>> {
        let path = Self::resolve_path(raw_form);
        match self.cache.get(&path).await? {
            Fetched::NotFound => Some(None),
            Fetched::Body(body) => Self::decode::<DataEnvelope<CanonicalTagDetail>>(&path, &body)
                .ok()
                .map(|envelope| Some(envelope.into_inner())),
        }
    }
}
