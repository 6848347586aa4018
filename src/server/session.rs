//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in a header. Requests without it are anonymous.

use super::state::ServerState;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use std::convert::Infallible;
use tracing::debug;

pub const HEADER_USER_ID_KEY: &str = "X-User-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

fn extract_session_from_request_parts(parts: &Parts) -> Option<Session> {
    let value = parts.headers.get(HEADER_USER_ID_KEY)?;
    let user_id = match value.to_str() {
        Ok(s) => s.trim(),
        Err(_) => {
            debug!("Ignoring non-ASCII user id header");
            return None;
        }
    };
    if user_id.is_empty() {
        return None;
    }
    Some(Session {
        user_id: user_id.to_string(),
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts).ok_or(SessionExtractionError::AccessDenied)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts))
    }
}
