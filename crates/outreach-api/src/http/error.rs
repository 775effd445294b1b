//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use outreach_core::pipeline::engine::EngineError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Resource does not exist.
    NotFound(String),
    /// Operation conflicts with the run's current status.
    Conflict(String),
    /// Validation error.
    Validation(String),
    /// A stage failed; the run is recorded as failed.
    RunFailed(String),
    /// Generic internal error.
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::RunNotFound(id) => AppError::NotFound(format!("Run '{id}' not found")),
            EngineError::NotSuspended { run_id, status } => AppError::Conflict(format!(
                "Run '{run_id}' is not suspended (current status: {status})"
            )),
            EngineError::StageFailed { .. } => AppError::RunFailed(e.to_string()),
            EngineError::Checkpoint(e) => AppError::Internal(e.to_string()),
            EngineError::State(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RunFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RUN_FAILED", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
