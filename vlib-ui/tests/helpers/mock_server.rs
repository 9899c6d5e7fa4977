//! Mock video library API for HTTP-level tests
//!
//! Serves a small fixed catalogue on an ephemeral port and records every
//! request URI. Special search queries trigger error responses:
//! - `ratelimited`: 429 with `Retry-After: 30`
//! - `ratelimited-bare`: 429 without `Retry-After`
//! - `ratelimited-garbage`: 429 with a non-numeric `Retry-After`
//! - `boom`: 500
//! - `slow`: answers after 2 seconds
//! - `zzz`: no matches, one suggestion
//!
//! Raw tag `broken` fails resolution with a 500; unknown raw tags are 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServerState {
    requests: Mutex<Vec<String>>,
}

impl ServerState {
    fn record(&self, uri: &Uri) {
        self.requests.lock().unwrap().push(uri.to_string());
    }
}

/// Running mock API server
pub struct MockServer {
    base_url: String,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind to 127.0.0.1 on an ephemeral port and start serving
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());

        let app = Router::new()
            .route("/api/v1/canonical-tags", get(search))
            .route("/api/v1/canonical-tags/resolve", get(resolve))
            .route("/api/v1/canonical-tags/:normalized_form", get(detail))
            .route("/api/v1/categories", get(categories))
            .route("/api/v1/topics/hierarchy", get(topics))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every request URI (path and query) seen so far
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests whose URI starts with `/api/v1{prefix}`
    pub fn count(&self, prefix: &str) -> usize {
        let full = format!("/api/v1{}", prefix);
        self.requests()
            .iter()
            .filter(|uri| uri.starts_with(&full))
            .count()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ========================================
// Fixtures
// ========================================

fn catalogue() -> Vec<Value> {
    vec![
        json!({
            "canonical_form": "JavaScript",
            "normalized_form": "javascript",
            "alias_count": 3,
            "video_count": 120,
            "top_aliases": [
                {"raw_form": "JavaScript", "occurrence_count": 80},
                {"raw_form": "javascript", "occurrence_count": 30},
                {"raw_form": "JS", "occurrence_count": 10}
            ]
        }),
        json!({
            "canonical_form": "Python",
            "normalized_form": "python",
            "alias_count": 5,
            "video_count": 300,
            "top_aliases": [
                {"raw_form": "Python", "occurrence_count": 200},
                {"raw_form": "python3", "occurrence_count": 50}
            ]
        }),
        json!({
            "canonical_form": "PyTorch",
            "normalized_form": "pytorch",
            "alias_count": 1,
            "video_count": 40,
            "top_aliases": [
                {"raw_form": "PyTorch", "occurrence_count": 40}
            ]
        }),
        json!({
            "canonical_form": "Rust",
            "normalized_form": "rust",
            "alias_count": 2,
            "video_count": 75,
            "top_aliases": [
                {"raw_form": "Rust", "occurrence_count": 70},
                {"raw_form": "rust-lang", "occurrence_count": 5}
            ]
        }),
    ]
}

/// Raw tag → normalized form
fn raw_tag_mapping(raw: &str) -> Option<&'static str> {
    match raw {
        "JavaScript" | "javascript" | "JS" => Some("javascript"),
        "Python" | "python" | "python3" => Some("python"),
        "PyTorch" => Some("pytorch"),
        "Rust" | "rust-lang" => Some("rust"),
        _ => None,
    }
}

fn find(normalized_form: &str) -> Option<Value> {
    catalogue()
        .into_iter()
        .find(|tag| tag["normalized_form"] == normalized_form)
}

fn list_item(tag: &Value) -> Value {
    json!({
        "canonical_form": tag["canonical_form"],
        "normalized_form": tag["normalized_form"],
        "alias_count": tag["alias_count"],
        "video_count": tag["video_count"],
    })
}

fn rate_limited(retry_after: Option<&'static str>) -> Response {
    match retry_after {
        Some(value) => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, value)],
            "Too Many Requests",
        )
            .into_response(),
        None => (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response(),
    }
}

// ========================================
// Handlers
// ========================================

async fn search(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record(&uri);

    let query = params.get("q").cloned().unwrap_or_default();
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(10);

    match query.as_str() {
        "ratelimited" => return rate_limited(Some("30")),
        "ratelimited-bare" => return rate_limited(None),
        "ratelimited-garbage" => return rate_limited(Some("soon")),
        "boom" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response();
        }
        "slow" => tokio::time::sleep(Duration::from_secs(2)).await,
        "zzz" => {
            return Json(json!({
                "data": [],
                "pagination": {"total": 0, "limit": limit, "offset": 0, "has_more": false},
                "suggestions": [{
                    "canonical_form": "Python",
                    "normalized_form": "python",
                    "alias_count": 5,
                    "similarity": 0.4
                }]
            }))
            .into_response();
        }
        _ => {}
    }

    let prefix = query.to_lowercase();
    let matches: Vec<Value> = catalogue()
        .iter()
        .filter(|tag| {
            tag["normalized_form"]
                .as_str()
                .map(|n| n.starts_with(&prefix))
                .unwrap_or(false)
        })
        .map(list_item)
        .collect();
    let total = matches.len();
    let page: Vec<Value> = matches.into_iter().take(limit).collect();

    Json(json!({
        "data": page,
        "pagination": {"total": total, "limit": limit, "offset": 0, "has_more": total > limit}
    }))
    .into_response()
}

async fn resolve(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record(&uri);

    let raw = params.get("raw_form").cloned().unwrap_or_default();
    if raw == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "resolver crashed").into_response();
    }

    match raw_tag_mapping(&raw).and_then(find) {
        // Bare detail, no envelope
        Some(detail) => Json(detail).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn detail(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    Path(normalized_form): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record(&uri);

    let alias_limit: usize = params
        .get("alias_limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(10);

    match find(&normalized_form) {
        Some(mut detail) => {
            if let Some(aliases) = detail["top_aliases"].as_array_mut() {
                aliases.truncate(alias_limit);
            }
            Json(json!({ "data": detail })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn categories(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    state.record(&uri);
    Json(json!({
        "data": [
            {"category_id": "10", "name": "Music", "video_count": 12},
            {"id": 27, "name": "Education", "video_count": 4}
        ]
    }))
    .into_response()
}

async fn topics(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    state.record(&uri);
    Json(json!([
        {
            "topic_id": "/m/04rlf",
            "name": "Music",
            "video_count": 12,
            "children": [
                {"topic_id": "/m/06by7", "name": "Rock music", "video_count": 3, "children": []}
            ]
        },
        {"topic_id": "/m/01k8wb", "name": "Knowledge", "video_count": 7, "children": []}
    ]))
    .into_response()
}
