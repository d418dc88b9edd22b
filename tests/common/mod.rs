#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use vocab_trainer::{ApiClient, ClientConfig};

pub const PASSWORD: &str = "correct horse";

/// Shared state of the mock remote service. Counters are observable from
/// the test body while the server runs.
#[derive(Clone, Default)]
pub struct MockState {
    pub refresh_calls: Arc<AtomicUsize>,
    pub words_calls: Arc<AtomicUsize>,
    pub refresh_fails: Arc<AtomicBool>,
    pub refresh_delay_ms: Arc<AtomicU64>,
    generation: Arc<AtomicUsize>,
    valid_access: Arc<Mutex<String>>,
    words: Arc<Mutex<Vec<Value>>>,
    recordings: Arc<Mutex<HashMap<String, (String, Bytes)>>>,
}

impl MockState {
    /// Makes the server reject the access token currently held by clients.
    pub fn expire_access_token(&self) {
        *self.valid_access.lock() = "expired".to_string();
    }

    pub fn fail_refresh(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    pub fn delay_refresh(&self, millis: u64) {
        self.refresh_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn words_count(&self) -> usize {
        self.words_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_access.lock());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some(expected.as_str())
    }

    fn issue_tokens(&self) -> Value {
        let n = self.generation.fetch_add(1, Ordering::SeqCst);
        let access = format!("access-{n}");
        *self.valid_access.lock() = access.clone();
        json!({ "accessToken": access, "refreshToken": format!("refresh-{n}") })
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = MockState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url))
    }

    pub fn client_with_timeout(&self, timeout: Duration) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url).with_timeout(timeout))
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/guest", post(guest))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/api/users/me", get(current_user))
        .route("/api/words", get(list_words))
        .route("/api/words/snapshot", put(put_snapshot))
        .route("/api/recordings/:id", put(put_recording).get(get_recording))
        .route("/api/languages", get(languages))
        .route("/api/broken", get(|| async { "<html>maintenance</html>" }))
        .route(
            "/api/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({ "success": true, "data": null }))
            }),
        )
        .with_state(state)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": message, "code": "UNAUTHORIZED" })),
    )
        .into_response()
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return unauthorized("invalid username or password");
    }
    Json(json!({ "success": true, "data": state.issue_tokens() })).into_response()
}

/// Deliberately answers without a refresh token.
async fn guest() -> Json<Value> {
    Json(json!({ "success": true, "data": { "accessToken": "guest-access" } }))
}

async fn refresh(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let presented = body.get("refreshToken").and_then(Value::as_str).unwrap_or("");
    if state.refresh_fails.load(Ordering::SeqCst) || !presented.starts_with("refresh-") {
        return unauthorized("refresh token rejected");
    }
    Json(json!({ "success": true, "data": state.issue_tokens() })).into_response()
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("access token expired");
    }
    Json(json!({
        "success": true,
        "data": { "id": "u-1", "username": "ada", "role": "USER", "isGuest": false }
    }))
    .into_response()
}

async fn list_words(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.words_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized("access token expired");
    }
    let words = state.words.lock().clone();
    Json(json!({ "success": true, "data": words })).into_response()
}

async fn put_snapshot(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("access token expired");
    }
    let words = body
        .get("words")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    *state.words.lock() = words;
    StatusCode::NO_CONTENT.into_response()
}

async fn put_recording(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("access token expired");
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    state.recordings.lock().insert(id, (content_type, body));
    StatusCode::NO_CONTENT.into_response()
}

async fn get_recording(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized("access token expired");
    }
    match state.recordings.lock().get(&id).cloned() {
        Some((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn languages() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "code": "nl", "name": "Dutch" },
            { "code": "sv", "name": "Swedish" }
        ]
    }))
}
