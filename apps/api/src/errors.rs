use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure modes of the roadmap generation pipeline.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Missing required fields: {0}")]
    InvalidRequest(String),

    #[error("Upstream model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream model returned no text")]
    UpstreamEmpty,

    #[error("Model output is not valid JSON: {reason}")]
    MalformedResponse {
        /// Unmodified model output. Logged, never sent to the caller.
        raw: String,
        reason: String,
    },

    #[error("Model output does not match the roadmap shape: {0}")]
    SchemaViolation(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "Validation error", msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "User already exists", msg.clone()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "Email or password is incorrect".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required",
                "A bearer token is required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Invalid token",
                "The bearer token is invalid or expired".to_string(),
            ),
            AppError::Generation(e) => generation_response(e),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error,
            "details": details,
        }));

        (status, body).into_response()
    }
}

/// Malformed output and schema violations share one public message; the
/// distinction only shows up in the logs.
fn generation_response(err: &GenerationError) -> (StatusCode, &'static str, String) {
    match err {
        GenerationError::InvalidRequest(_) => (
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            "Career, experience, and goals are required".to_string(),
        ),
        GenerationError::UpstreamUnavailable(msg) => {
            tracing::error!("Roadmap generation failed upstream: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate roadmap",
                "The AI service is currently unavailable".to_string(),
            )
        }
        GenerationError::UpstreamEmpty
        | GenerationError::MalformedResponse { .. }
        | GenerationError::SchemaViolation(_) => {
            tracing::error!("Roadmap generation produced unusable output: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid response format",
                "The AI generated an invalid JSON response".to_string(),
            )
        }
    }
}
