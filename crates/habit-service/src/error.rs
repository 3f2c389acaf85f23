//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use habit_core::HabitId;
use habit_store::{StoreError, TrackerError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store could not be reached. Safe to retry.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A habit was saved but the matching profile update was not.
    #[error("habit {habit_id} saved but profile update failed")]
    PartialFailure {
        /// The habit that was saved.
        habit_id: HabitId,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "Storage is temporarily unavailable".to_string(),
                    None,
                )
            }
            Self::PartialFailure { habit_id } => {
                tracing::error!(habit_id = %habit_id, "Partial failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_failure",
                    self.to_string(),
                    Some(serde_json::json!({ "habitId": habit_id })),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            StoreError::Database(msg) => Self::Unavailable(msg),
            StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::HabitNotFound { habit_id } => {
                Self::NotFound(format!("habit not found: {habit_id}"))
            }
            TrackerError::Invalid(e) => Self::BadRequest(e.to_string()),
            TrackerError::Store(e) => e.into(),
            TrackerError::ProfileOutOfSync { habit, .. } => {
                Self::PartialFailure { habit_id: habit.id }
            }
        }
    }
}
