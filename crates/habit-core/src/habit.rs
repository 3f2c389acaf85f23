//! Habit types.
//!
//! A [`Habit`] owns its completion history as a set of calendar days, so the
//! "each day at most once, ascending order" rule holds by construction.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};
use crate::{HabitId, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Maximum habit (and profile) name length in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Maximum habit description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A tracked habit belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Habit ID, assigned by the store.
    pub id: HabitId,

    /// The owning user.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the habit was created.
    pub created_at: DateTime<Utc>,

    /// Days on which the habit was completed, ascending and unique.
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,

    /// Consecutive completed days ending at the most recent completion.
    #[serde(default)]
    pub current_streak: u32,

    /// Longest streak ever reached. Never decreases, survives resets.
    #[serde(default)]
    pub best_streak: u32,
}

impl Habit {
    /// Create a habit with no completions.
    #[must_use]
    pub fn new(id: HabitId, user_id: UserId, new: NewHabit, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            name: new.name,
            description: new.description,
            created_at,
            completed_dates: BTreeSet::new(),
            current_streak: 0,
            best_streak: 0,
        }
    }

    /// Check whether the habit was completed on `day`.
    #[must_use]
    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed_dates.contains(&day)
    }

    /// Number of days the habit was completed.
    #[must_use]
    pub fn completion_count(&self) -> usize {
        self.completed_dates.len()
    }

    /// Convert to the interchange shape (drops the owner).
    #[must_use]
    pub fn to_view(&self) -> HabitView {
        HabitView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            completed_dates: self.completed_dates.clone(),
            current_streak: self.current_streak,
            best_streak: self.best_streak,
        }
    }

    /// Rebuild a habit from its interchange shape for `user_id`.
    #[must_use]
    pub fn from_view(user_id: UserId, view: HabitView) -> Self {
        Self {
            id: view.id,
            user_id,
            name: view.name,
            description: view.description,
            created_at: view.created_at,
            completed_dates: view.completed_dates,
            current_streak: view.current_streak,
            best_streak: view.best_streak,
        }
    }
}

/// The habit shape exchanged with HTTP clients and the offline fallback.
///
/// ```text
/// { id, name, description?, createdAt, completedDates: [string], currentStreak, bestStreak }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    /// Habit ID.
    pub id: HabitId,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: DateTime<Utc>,
    /// Completion days as `YYYY-MM-DD`, ascending.
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    /// Current streak.
    #[serde(default)]
    pub current_streak: u32,
    /// Best streak.
    #[serde(default)]
    pub best_streak: u32,
}

/// Validated input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Trimmed description; blank input becomes `None`.
    pub description: Option<String>,
}

impl NewHabit {
    /// Validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns [`HabitError::EmptyName`] or [`HabitError::TooLong`].
    pub fn parse(name: &str, description: Option<&str>) -> Result<Self> {
        Ok(Self {
            name: validate_name("name", name)?,
            description: normalize_description(description)?,
        })
    }
}

/// Trim and check a display name.
///
/// # Errors
///
/// Returns an error if the trimmed name is empty or longer than
/// [`MAX_NAME_CHARS`].
pub fn validate_name(field: &'static str, raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(HabitError::EmptyName { field });
    }
    let len = name.chars().count();
    if len > MAX_NAME_CHARS {
        return Err(HabitError::TooLong {
            field,
            len,
            max: MAX_NAME_CHARS,
        });
    }
    Ok(name.to_string())
}

fn normalize_description(raw: Option<&str>) -> Result<Option<String>> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let len = text.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(HabitError::TooLong {
            field: "description",
            len,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(Some(text.to_string()))
}
