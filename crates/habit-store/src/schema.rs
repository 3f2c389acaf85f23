//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Habit records, keyed by `user_prefix || habit_id` (ULID).
    pub const HABITS: &str = "habits";

    /// Profile records, keyed by `user_prefix`.
    pub const PROFILES: &str = "profiles";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::HABITS, cf::PROFILES]
}
