use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Bad model output: {0}")]
    BadModelOutput(String),

    #[error("Place description error: {0}")]
    Narrative(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal database error")
            }
            AppError::Geocoding(ref e) => {
                tracing::error!("Geocoding error: {}", e);
                (StatusCode::BAD_GATEWAY, "Geocoding service error")
            }
            AppError::Routing(ref e) => {
                tracing::warn!("Routing error: {}", e);
                (StatusCode::BAD_GATEWAY, e.as_str())
            }
            AppError::Llm(ref e) => {
                tracing::error!("LLM error: {}", e);
                (StatusCode::BAD_GATEWAY, "Trip planning model error")
            }
            AppError::BadModelOutput(ref e) => {
                tracing::warn!("Bad model output: {}", e);
                (StatusCode::BAD_GATEWAY, "Bad model output")
            }
            AppError::Narrative(ref e) => {
                tracing::error!("Place description error: {}", e);
                (StatusCode::BAD_GATEWAY, e.as_str())
            }
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::Unauthorized(ref e) => (StatusCode::UNAUTHORIZED, e.as_str()),
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.as_str()),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
