//! In-process fakes of the upstream services
//!
//! A single axum app plays the catalog accounts service, the catalog Web
//! API, the OpenAI-compatible completion API and the video index. Every
//! base URL the server is configured with points at it.

use super::constants::*;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct FakeState {
    generation: Mutex<String>,
    generation_status: Mutex<Option<u16>>,
    prompts: Mutex<Vec<String>>,
    token_requests: AtomicUsize,
    search_queries: Mutex<Vec<String>>,
    generation_requests: AtomicUsize,
    video_requests: AtomicUsize,
}

/// Handle to a running fake upstream. Shuts down when dropped.
pub struct FakeUpstreams {
    pub base_url: String,
    state: Arc<FakeState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeUpstreams {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/search", get(catalog_search))
            .route("/chat/completions", post(chat_completions))
            .route("/models", get(models))
            .route("/search", get(video_search))
            .with_state(state.clone());

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

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Sets the text every completion request answers with.
    pub fn set_generation(&self, text: &str) {
        *self.state.generation.lock().unwrap() = text.to_string();
    }

    /// Makes the completion API answer with `status` instead of a completion.
    pub fn fail_generation(&self, status: u16) {
        *self.state.generation_status.lock().unwrap() = Some(status);
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn generation_requests(&self) -> usize {
        self.state.generation_requests.load(Ordering::SeqCst)
    }

    pub fn video_requests(&self) -> usize {
        self.state.video_requests.load(Ordering::SeqCst)
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.state.search_queries.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

impl Drop for FakeUpstreams {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

fn album_json(id: &str, name: &str, artist: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "id": format!("{}-artist", id), "name": artist }],
        "images": [{ "url": format!("https://img.test/{}.jpg", id), "width": 640, "height": 640 }],
        "release_date": "2020-01-01",
        "external_urls": { "spotify": format!("https://open.spotify.com/album/{}", id) }
    })
}

fn all_albums() -> Vec<(String, Value)> {
    vec![
        (
            ALBUM_1_NAME.to_string(),
            album_json(ALBUM_1_ID, ALBUM_1_NAME, ARTIST_1_NAME),
        ),
        (
            ALBUM_2_NAME.to_string(),
            album_json(ALBUM_2_ID, ALBUM_2_NAME, ARTIST_2_NAME),
        ),
    ]
}

fn all_tracks() -> Vec<(String, Value)> {
    let track = |id: &str, name: &str, artist: &str, album: Value| {
        json!({
            "id": id,
            "name": name,
            "artists": [{ "name": artist }],
            "album": album,
            "preview_url": format!("https://preview.test/{}.mp3", id),
            "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) }
        })
    };
    vec![
        (
            TRACK_1_NAME.to_string(),
            track(
                TRACK_1_ID,
                TRACK_1_NAME,
                ARTIST_1_NAME,
                album_json(ALBUM_1_ID, ALBUM_1_NAME, ARTIST_1_NAME),
            ),
        ),
        (
            TRACK_2_NAME.to_string(),
            track(
                TRACK_2_ID,
                TRACK_2_NAME,
                ARTIST_2_NAME,
                album_json(ALBUM_2_ID, ALBUM_2_NAME, ARTIST_2_NAME),
            ),
        ),
    ]
}

/// Items whose name appears in the query come first, the rest keep catalog order.
fn rank(items: Vec<(String, Value)>, query: &str) -> Vec<Value> {
    let query = query.to_lowercase();
    let (mut hits, rest): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|(name, _)| query.contains(&name.to_lowercase()));
    hits.extend(rest);
    hits.into_iter().map(|(_, value)| value).collect()
}

async fn token(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    let expected = format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", FAKE_CLIENT_ID, FAKE_CLIENT_SECRET))
    );
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized || form.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_client" })))
            .into_response();
    }

    Json(json!({
        "access_token": FAKE_ACCESS_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

async fn catalog_search(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let bearer = format!("Bearer {}", FAKE_ACCESS_TOKEN);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let query = params.get("q").cloned().unwrap_or_default();
    state.search_queries.lock().unwrap().push(query.clone());

    match params.get("type").map(String::as_str) {
        Some("track") => {
            let items = rank(all_tracks(), &query);
            Json(json!({ "tracks": { "items": items, "total": 2, "limit": 20, "offset": 0 } }))
                .into_response()
        }
        Some("album") => {
            let items = rank(all_albums(), &query);
            Json(json!({ "albums": { "items": items, "total": 2, "limit": 20, "offset": 0 } }))
                .into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

// ============================================================================
// Generation
// ============================================================================

async fn chat_completions(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<Value>,
) -> Response {
    state.generation_requests.fetch_add(1, Ordering::SeqCst);

    if let Some(prompt) = body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|m| m["content"].as_str())
    {
        state.prompts.lock().unwrap().push(prompt.to_string());
    }

    if let Some(status) = *state.generation_status.lock().unwrap() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "upstream exploded").into_response();
    }

    let content = state.generation.lock().unwrap().clone();
    Json(json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    }))
    .into_response()
}

async fn models() -> impl IntoResponse {
    Json(json!({ "data": [{ "id": "test-model" }] }))
}

// ============================================================================
// Video index
// ============================================================================

async fn video_search(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.video_requests.fetch_add(1, Ordering::SeqCst);
    let query = params.get("q").cloned().unwrap_or_default();

    Json(json!({
        "items": [{
            "id": { "kind": "youtube#video", "videoId": FAKE_VIDEO_ID },
            "snippet": {
                "title": query,
                "thumbnails": { "high": { "url": format!("https://img.test/{}.jpg", FAKE_VIDEO_ID) } }
            }
        }]
    }))
}
