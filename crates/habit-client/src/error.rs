//! Client error types.

use habit_core::{HabitError, HabitId};

/// Errors that can occur when using the habit tracker client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Missing or rejected credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// The request was rejected as invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The habit (or other resource) does not exist for this user.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server's store is temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The habit was saved but the profile update failed.
    #[error("habit {habit_id} saved but profile update failed")]
    PartialFailure {
        /// The habit that was saved.
        habit_id: HabitId,
    },

    /// A local habit does not exist.
    #[error("habit not found: {habit_id}")]
    HabitNotFound {
        /// The habit ID.
        habit_id: HabitId,
    },

    /// Local input or backup validation failed.
    #[error(transparent)]
    Invalid(#[from] HabitError),

    /// Reading or writing the local data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 && *status != 501,
            _ => false,
        }
    }
}
