//! Error types for the habit tracker core.

use crate::ids::IdError;

/// Result type for habit tracker core operations.
pub type Result<T> = std::result::Result<T, HabitError>;

/// Errors raised by validation and backup handling in the core crate.
///
/// Progression itself never fails; an already-completed day is an outcome,
/// not an error (see [`crate::progression::Completion`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HabitError {
    /// A name was empty after trimming.
    #[error("{field} must not be empty")]
    EmptyName {
        /// Which field was empty.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} is too long: {len} characters (max {max})")]
    TooLong {
        /// Which field was too long.
        field: &'static str,
        /// Actual length in characters.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// A backup document could not be accepted.
    #[error("invalid backup: {0}")]
    InvalidBackup(String),
}
