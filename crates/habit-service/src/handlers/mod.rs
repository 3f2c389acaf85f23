//! API handlers.
//!
//! Tracker calls run on the blocking pool through [`with_tracker`], since a
//! call may wait on another request's per-key lock.

pub mod backup;
pub mod habits;
pub mod health;
pub mod profile;
pub mod progress;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use habit_core::HabitId;
use habit_store::Tracker;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a habit ID taken from the request path.
fn parse_habit_id(raw: &str) -> Result<HabitId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid habit id: {raw}")))
}

/// The server's current UTC calendar date, used when a request names none.
fn server_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Run a synchronous tracker operation without blocking an async worker.
async fn with_tracker<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Tracker) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let tracker = Arc::clone(&state.tracker);
    tokio::task::spawn_blocking(move || f(&tracker))
        .await
        .map_err(|e| ApiError::Internal(format!("tracker task failed: {e}")))?
}
