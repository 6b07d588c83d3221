use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures talking to the metadata provider
///
/// The tracker recovers from these wherever a fallback exists (initialize,
/// per-season refresh). They only reach the caller when there is none.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider response could not be decoded: {0}")]
    Decode(String),

    #[error("Provider has no data for {0}")]
    Missing(String),
}

/// Failures reading or writing progress documents
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Metadata provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvariantViolation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Provider(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
pub type ProviderResult<T> = Result<T, ProviderError>;
pub type StoreResult<T> = Result<T, StoreError>;
