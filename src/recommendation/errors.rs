use crate::llm::LlmError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Failures that abort a recommendation cycle.
///
/// Catalog, enrichment and history failures never show up here; they are
/// absorbed where they happen.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Suggestion generation failed: {0}")]
    GenerationFailed(#[from] LlmError),

    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),
}

impl RecommendationError {
    pub fn metric_label(&self) -> &'static str {
        match self {
            RecommendationError::GenerationFailed(_) => "generation_failed",
            RecommendationError::MalformedGenerationOutput(_) => "malformed_generation_output",
        }
    }
}

impl IntoResponse for RecommendationError {
    fn into_response(self) -> Response {
        // Upstream details stay in the logs.
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to generate recommendations" })),
        )
            .into_response()
    }
}
