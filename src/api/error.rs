/// HTTP error responses
///
/// Rule violations keep their own `{"errors": [...]}` body so clients can
/// point at the offending fields. Everything else uses a single
/// `{"error": {"code", "message"}}` envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::Rejection;
use crate::lifecycle::LifecycleError;

/// Errors a handler can answer with
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(Rejection),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Habit not found: {0}")]
    NotFound(String),

    #[error("Missing or invalid caller identity")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(_) | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Rejected(_) => "rejected",
            ApiError::InvalidPayload(_) => "invalid_payload",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Storage(_) => "storage_error",
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Rejected(rejection) => ApiError::Rejected(rejection),
            LifecycleError::InvalidPayload(e) => ApiError::InvalidPayload(e.to_string()),
            LifecycleError::NotFound { habit_id } => ApiError::NotFound(habit_id),
            LifecycleError::Storage(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidPayload(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Rejected(rejection) => json!(rejection),
            ApiError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                json!({
                    "error": {
                        "code": self.code(),
                        "message": "internal storage error",
                    }
                })
            }
            other => json!({
                "error": {
                    "code": other.code(),
                    "message": other.to_string(),
                }
            }),
        };
        (status, Json(body)).into_response()
    }
}
