//! Core types and the progression engine for the habit tracker.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: `UserId`, `HabitId`
//! - **Habits**: `Habit`, `HabitView`, `NewHabit`
//! - **Profiles**: `Profile`, `ProfileView`, `ProfileUpdate`
//! - **Badges**: `Badge`, the milestone table and badge progress
//! - **Progression**: streak, XP, level and badge rules
//! - **Statistics**: `ProgressSummary`
//! - **Backups**: `Backup` export/import documents
//!
//! # Progression
//!
//! **Each newly completed day = 10 XP; 100 XP = 1 level.**
//!
//! - A day can be completed once per habit; repeating it is a no-op
//! - Badges unlock at 100 / 300 / 600 / 1000 lifetime XP
//! - A reset clears a habit's history but never its best streak

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backup;
pub mod badge;
pub mod error;
pub mod habit;
pub mod ids;
pub mod profile;
pub mod progression;
pub mod stats;

pub use backup::{Backup, Restored, BACKUP_VERSION};
pub use badge::{Badge, BadgeProgress, Milestone, MILESTONES};
pub use error::{HabitError, Result};
pub use habit::{Habit, HabitView, NewHabit, MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS};
pub use ids::{HabitId, IdError, UserId};
pub use profile::{Profile, ProfileUpdate, ProfileView, DEFAULT_PROFILE_NAME};
pub use progression::{
    compute_streak, Completion, Outcome, XpAward, XP_PER_COMPLETION, XP_PER_LEVEL,
};
pub use stats::{DayStats, HabitStats, ProgressSummary};
