//! Storage layer for the habit tracker.
//!
//! This crate provides persistent storage for habits and profiles, and the
//! [`Tracker`] that runs progression operations as serialized
//! read-modify-write transactions on top of any [`Store`].
//!
//! # Architecture
//!
//! The `RocksDB` backend (feature `rocksdb-backend`, on by default) uses two
//! column families:
//!
//! - `habits`: habit records, keyed by `user_prefix || habit_id`
//! - `profiles`: profile records, keyed by `user_prefix`
//!
//! [`MemoryStore`] implements the same trait in memory.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use habit_core::UserId;
//! use habit_store::{RocksStore, Tracker};
//!
//! let store = RocksStore::open("/tmp/habit-db").unwrap();
//! let tracker = Tracker::new(Arc::new(store));
//!
//! let user_id = UserId::generate();
//! let habit = tracker.create_habit(&user_id, "Drink water", None).unwrap();
//! let today = chrono::Utc::now().date_naive();
//! let completion = tracker.complete_habit(&user_id, &habit.id, today).unwrap();
//! assert_eq!(completion.xp_gained(), 10);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod locks;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;
pub mod tracker;

pub use error::{Result, StoreError, TrackerError};
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;
pub use tracker::{Tracker, TrackerResult};

use habit_core::{Habit, HabitId, NewHabit, Profile, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing and offline use). Implementations
/// make each call atomic on its own; sequencing across calls is the
/// [`Tracker`]'s job.
pub trait Store: Send + Sync {
    // =========================================================================
    // Habit Operations
    // =========================================================================

    /// Insert or update a habit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_habit(&self, habit: &Habit) -> Result<()>;

    /// Get a habit by owner and ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<Option<Habit>>;

    /// List a user's habits in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_habits(&self, user_id: &UserId) -> Result<Vec<Habit>>;

    /// Delete a habit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the habit doesn't exist.
    fn delete_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<()>;

    /// Create a habit, assigning its ID and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_habit(&self, user_id: &UserId, new: NewHabit) -> Result<Habit> {
        let habit = Habit::new(HabitId::generate(), user_id.clone(), new, chrono::Utc::now());
        self.put_habit(&habit)?;
        Ok(habit)
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>>;

    /// Insert or update a profile record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// Store `profile` unless the user already has one, atomically.
    ///
    /// Returns whichever profile is stored afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile>;

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Replace all of a user's habits and their profile in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is changed.
    fn replace_user_data(&self, user_id: &UserId, habits: &[Habit], profile: &Profile)
        -> Result<()>;

    /// Delete all of a user's habits and their profile in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_user_data(&self, user_id: &UserId) -> Result<()>;
}
