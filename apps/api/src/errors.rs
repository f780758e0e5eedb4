use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type for the collaborator seams.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The webhook itself never surfaces these as HTTP errors: it answers 200
/// with the failure carried in the payload (the messaging relay in front of
/// it does not show status codes to the end user).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Retrieval error: {0}")]
    Retrieval(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Retrieval(msg) => {
                tracing::error!("Retrieval error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RETRIEVAL_ERROR",
                    "A knowledge retrieval error occurred".to_string(),
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
