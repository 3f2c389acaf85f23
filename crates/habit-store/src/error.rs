//! Error types for habit storage.

use habit_core::{Habit, HabitError, HabitId};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed. Usually transient.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
}

/// Errors returned by [`crate::Tracker`] operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The habit does not exist for this user.
    #[error("habit not found: {habit_id}")]
    HabitNotFound {
        /// The habit ID that was looked up.
        habit_id: HabitId,
    },

    /// Input was rejected before any state changed.
    #[error(transparent)]
    Invalid(#[from] HabitError),

    /// The store failed; nothing was written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The habit was saved but saving the profile failed, so the two are out
    /// of sync. The saved habit is returned so the caller can retry or flag it.
    #[error("habit {} saved but profile update failed: {source}", .habit.id)]
    ProfileOutOfSync {
        /// The habit as saved.
        habit: Box<Habit>,
        /// The profile write error.
        source: StoreError,
    },
}
