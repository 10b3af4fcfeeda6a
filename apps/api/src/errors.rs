use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            // Never degrade to an empty result: the client must be able to tell
            // "no good matches" from "matching is down".
            AppError::Embedding(e) if e.is_transient() => {
                tracing::warn!("Embedding provider unavailable: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "MATCHING_UNAVAILABLE",
                    "Recommendations are temporarily unavailable, please try again later"
                        .to_string(),
                )
            }
            AppError::Embedding(e) => {
                tracing::error!("Embedding configuration error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMBEDDING_CONFIGURATION_ERROR",
                    "Recommendations are unavailable due to a service configuration problem"
                        .to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
