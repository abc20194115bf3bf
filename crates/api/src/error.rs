use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use illustrator_core::error::CoreError;
use illustrator_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`PipelineError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `illustrator_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An orchestrator error from `illustrator_pipeline`.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Pipeline(pipeline) => match pipeline {
                PipelineError::Core(core) => classify_core_error(core),
                PipelineError::Storage { path, source } => {
                    tracing::error!(path = %path.display(), error = %source, "Storage error");
                    internal()
                }
                PipelineError::Cancelled => {
                    tracing::warn!("Generation cancelled before completion");
                    (
                        StatusCode::REQUEST_TIMEOUT,
                        "REQUEST_CANCELLED",
                        "Generation was cancelled and its images discarded".to_string(),
                    )
                }
                PipelineError::Synthesis(err) => {
                    tracing::error!(error = %err, "Image generation failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "GENERATION_FAILED",
                        format!("Image generation failed: {err}"),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::InvalidArgument(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
        }
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{what} not found"),
        ),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// 500 with a sanitized message.
fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
