//! Habit Tracker Client SDK.
//!
//! This crate provides a client library for the habit tracker API, plus an
//! offline tracker that keeps a guest's habits in a local file.
//!
//! # Example
//!
//! ```no_run
//! use habit_client::HabitClient;
//!
//! # async fn example() -> Result<(), habit_client::ClientError> {
//! let client = HabitClient::new("http://habits:8080", "user-bearer-token")?;
//!
//! let habit = client.create_habit("Drink water", None).await?;
//! let result = client.complete_habit(&habit.id, None).await?;
//!
//! println!(
//!     "+{} XP, level {} ({} total)",
//!     result.xp_gained, result.profile.level, result.profile.total_xp
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Offline mode
//!
//! ```no_run
//! use habit_client::OfflineTracker;
//!
//! # async fn example() -> Result<(), habit_client::ClientError> {
//! let tracker = OfflineTracker::open("habits.json").await?;
//! let habit = tracker.create_habit("Stretch", None).await?;
//! let today = chrono::Utc::now().date_naive();
//! tracker.complete_habit(&habit.id, today).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod offline;
mod types;

pub use client::{ClientOptions, HabitClient};
pub use error::ClientError;
pub use offline::{OfflineTracker, GUEST_USER_ID};
pub use types::*;
