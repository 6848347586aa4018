use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info};

use crate::recommendation::RecommendationRequest;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::metrics::{metrics_handler, record_error};
use super::session::Session;
use super::{log_requests, state::*, ServerConfig};

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub user_id: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RecommendationQuery {
    pub mood: Option<String>,
    pub genre: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HistoryQuery {
    pub limit: Option<usize>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
        user_id: session.map(|s| s.user_id),
    };
    Json(stats)
}

async fn get_recommendations(
    session: Option<Session>,
    State(engine): State<GuardedEngine>,
    Query(query): Query<RecommendationQuery>,
) -> Response {
    let (mood, genre) = match (query.mood, query.genre) {
        (Some(mood), Some(genre)) if !mood.trim().is_empty() && !genre.trim().is_empty() => {
            (mood, genre)
        }
        _ => {
            record_error("bad_request", "/recommendations");
            return error_response(StatusCode::BAD_REQUEST, "mood and genre are required");
        }
    };

    // Cache keys are exact: values are passed on untrimmed.
    let request = RecommendationRequest {
        user_id: session.map(|s| s.user_id),
        mood,
        genre,
    };

    match engine.recommend(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_history(
    session: Session,
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, state.config.max_history_limit.max(1));
    let history = state.history.clone();
    let user_id = session.user_id;

    match tokio::task::spawn_blocking(move || history.list_recommendations(&user_id, limit)).await
    {
        Ok(Ok(records)) => Json(records).into_response(),
        Ok(Err(e)) => {
            error!("Failed to list recommendation history: {:#}", e);
            record_error("history_store_failed", "/history");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
        }
        Err(e) => {
            error!("History task failed: {}", e);
            record_error("history_store_failed", "/history");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
        }
    }
}

async fn post_played(
    session: Session,
    State(history): State<GuardedHistoryStore>,
    Path(track_id): Path<String>,
) -> Response {
    let user_id = session.user_id;
    match tokio::task::spawn_blocking(move || history.record_played(&user_id, &track_id)).await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => {
            error!("Failed to record play: {:#}", e);
            record_error("history_store_failed", "/played");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!("Play recording task failed: {}", e);
            record_error("history_store_failed", "/played");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    engine: GuardedEngine,
    history: GuardedHistoryStore,
) -> Router {
    let state = ServerState::new(config, engine, history);

    Router::new()
        .route("/", get(home))
        .route("/recommendations", get(get_recommendations))
        .route("/history", get(get_history))
        .route("/played/{track_id}", post(post_played))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    engine: GuardedEngine,
    history: GuardedHistoryStore,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, engine, history);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let api = async { axum::serve(listener, app).await.context("API server failed") };
    let metrics = async {
        axum::serve(metrics_listener, make_metrics_app())
            .await
            .context("Metrics server failed")
    };
    tokio::try_join!(api, metrics)?;
    Ok(())
}
