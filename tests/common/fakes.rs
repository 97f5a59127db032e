//! Fake upstream services for end-to-end tests
//!
//! Each fake is a small axum app bound to a random local port. It records
//! what it receives so tests can assert on the exact upstream requests.

use super::constants::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request as seen by a fake upstream
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    fn new(
        method: &str,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: String,
    ) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        Self {
            method: method.to_string(),
            path,
            query,
            headers,
            body,
        }
    }
}

/// Binds a router to 127.0.0.1:0 and serves it until the sender is dropped.
async fn spawn_router(app: Router) -> (String, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Fake upstream failed");
    });

    (format!("http://127.0.0.1:{}", port), shutdown_tx)
}

// ============================================================================
// Fake Catalog API
// ============================================================================

#[derive(Clone, Default)]
struct FakeCatalogState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    tokens_issued: Arc<AtomicUsize>,
    /// Tokens issued at or below this serial are rejected with 401.
    revoked_up_to: Arc<AtomicUsize>,
    /// When set, search and recommendations answer with this status.
    forced_status: Arc<Mutex<Option<u16>>>,
    /// When set, search and recommendations answer with this raw body.
    forced_body: Arc<Mutex<Option<String>>>,
}

impl FakeCatalogState {
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn check_bearer(&self, headers: &HeaderMap) -> Result<(), Response> {
        let serial = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(&format!("Bearer {}-", TEST_ACCESS_TOKEN)))
            .and_then(|n| n.parse::<usize>().ok());

        match serial {
            Some(n) if n > self.revoked_up_to.load(Ordering::SeqCst) => Ok(()),
            _ => Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid token"})))
                .into_response()),
        }
    }

    fn forced_response(&self) -> Option<Response> {
        if let Some(status) = *self.forced_status.lock().unwrap() {
            let status = StatusCode::from_u16(status).unwrap();
            return Some((status, Json(json!({"error": "forced failure"}))).into_response());
        }
        self.forced_body
            .lock()
            .unwrap()
            .clone()
            .map(|body| (StatusCode::OK, body).into_response())
    }
}

fn api_track(id: Option<&str>, name: &str, artist: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{"name": artist}],
        "album": {
            "name": format!("{} (Single)", name),
            "images": [{"url": format!("https://img.example.com/{}.jpg", name.to_lowercase().replace(' ', "-"))}]
        },
        "preview_url": null,
        "external_urls": {"spotify": id.map(|id| format!("https://open.example.com/track/{}", id))},
        "duration_ms": 201000
    })
}

fn fake_tracks() -> Vec<Value> {
    vec![
        api_track(Some(TRACK_1_ID), TRACK_1_NAME, TRACK_1_ARTIST),
        api_track(Some(TRACK_2_ID), TRACK_2_NAME, TRACK_1_ARTIST),
        // Local files come without an id and must be dropped.
        api_track(None, "Local Demo", TRACK_1_ARTIST),
    ]
}

async fn fake_token(
    State(state): State<FakeCatalogState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(RecordedRequest::new(
        "POST",
        "/api/token".to_string(),
        HashMap::new(),
        &headers,
        body.clone(),
    ));

    if !headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
        || body != "grant_type=client_credentials"
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_client"}))).into_response();
    }

    let serial = state.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("{}-{}", TEST_ACCESS_TOKEN, serial),
        "token_type": "Bearer",
        "expires_in": TEST_TOKEN_LIFETIME_SECS,
    }))
    .into_response()
}

async fn fake_search(
    State(state): State<FakeCatalogState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(RecordedRequest::new(
        "GET",
        "/v1/search".to_string(),
        query,
        &headers,
        String::new(),
    ));
    if let Err(response) = state.check_bearer(&headers) {
        return response;
    }
    if let Some(response) = state.forced_response() {
        return response;
    }
    Json(json!({"tracks": {"items": fake_tracks()}})).into_response()
}

async fn fake_recommendations(
    State(state): State<FakeCatalogState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(RecordedRequest::new(
        "GET",
        "/v1/recommendations".to_string(),
        query,
        &headers,
        String::new(),
    ));
    if let Err(response) = state.check_bearer(&headers) {
        return response;
    }
    if let Some(response) = state.forced_response() {
        return response;
    }
    Json(json!({"tracks": fake_tracks(), "seeds": []})).into_response()
}

/// In-process stand-in for the music-catalog API
pub struct FakeCatalogApi {
    /// Base URL of the fake (e.g., "http://127.0.0.1:12345")
    pub base_url: String,
    state: FakeCatalogState,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl FakeCatalogApi {
    pub async fn spawn() -> Self {
        let state = FakeCatalogState::default();
        let app = Router::new()
            .route("/api/token", post(fake_token))
            .route("/v1/search", get(fake_search))
            .route("/v1/recommendations", get(fake_recommendations))
            .with_state(state.clone());

        let (base_url, shutdown_tx) = spawn_router(app).await;
        Self {
            base_url,
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    /// Number of tokens handed out so far
    pub fn tokens_issued(&self) -> usize {
        self.state.tokens_issued.load(Ordering::SeqCst)
    }

    /// Rejects every token issued so far, as if they had been revoked upstream
    pub fn revoke_tokens(&self) {
        self.state
            .revoked_up_to
            .store(self.tokens_issued(), Ordering::SeqCst);
    }

    /// Makes search and recommendations fail with `status`
    pub fn fail_with(&self, status: u16) {
        *self.state.forced_status.lock().unwrap() = Some(status);
    }

    /// Makes search and recommendations answer 200 with `body`
    pub fn respond_with_body(&self, body: &str) {
        *self.state.forced_body.lock().unwrap() = Some(body.to_string());
    }

    /// All requests received, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests received on `path`, oldest first
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

// ============================================================================
// Fake Mood Log Backend
// ============================================================================

#[derive(Clone, Default)]
struct FakeMoodLogState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    rows: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicUsize>,
}

fn check_api_key(headers: &HeaderMap) -> Result<(), Response> {
    let apikey_ok = headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TEST_MOOD_LOG_KEY);
    let bearer_ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TEST_MOOD_LOG_KEY));

    if apikey_ok && bearer_ok {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid API key"}))).into_response())
    }
}

async fn fake_insert_row(
    State(state): State<FakeMoodLogState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest::new(
        "POST",
        format!("/rest/v1/{}", table),
        HashMap::new(),
        &headers,
        body.clone(),
    ));
    if let Err(response) = check_api_key(&headers) {
        return response;
    }
    if table != TEST_MOOD_LOG_TABLE {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "relation does not exist"})))
            .into_response();
    }

    let mut row: Value = match serde_json::from_str(&body) {
        Ok(row) => row,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    row["id"] = json!(id);
    state.rows.lock().unwrap().push(row.clone());

    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn fake_select_rows(
    State(state): State<FakeMoodLogState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest::new(
        "GET",
        format!("/rest/v1/{}", table),
        query.clone(),
        &headers,
        String::new(),
    ));
    if let Err(response) = check_api_key(&headers) {
        return response;
    }

    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let mut rows = state.rows.lock().unwrap().clone();
    if query.get("order").map(String::as_str) == Some("created_at.desc") {
        let created_at = |row: &Value| {
            row["created_at"]
                .as_str()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        };
        rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    }
    rows.truncate(limit);

    Json(rows).into_response()
}

/// In-process stand-in for the hosted mood-log database's REST row API
pub struct FakeMoodLogApi {
    /// Base URL of the fake (e.g., "http://127.0.0.1:12345")
    pub base_url: String,
    state: FakeMoodLogState,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl FakeMoodLogApi {
    pub async fn spawn() -> Self {
        let state = FakeMoodLogState::default();
        let app = Router::new()
            .route(
                "/rest/v1/{table}",
                post(fake_insert_row).get(fake_select_rows),
            )
            .with_state(state.clone());

        let (base_url, shutdown_tx) = spawn_router(app).await;
        Self {
            base_url,
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// Rows stored so far, in insertion order
    pub fn rows(&self) -> Vec<Value> {
        self.state.rows.lock().unwrap().clone()
    }

    /// All requests received, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}
