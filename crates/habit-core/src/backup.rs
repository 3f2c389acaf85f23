//! Backup documents for export and import.
//!
//! A backup holds a user's habits and profile in the interchange shapes, plus
//! a format version and the export time. The offline client stores its whole
//! state in this format, so a guest's file can be imported after signing in.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};
use crate::habit::{HabitView, NewHabit};
use crate::profile::{Profile, ProfileUpdate, ProfileView};
use crate::progression::{level_for_total_xp, refresh_streaks, unlock_badges, xp_into_level};
use crate::{Habit, HabitId, UserId};

/// Current backup format version.
pub const BACKUP_VERSION: &str = "1.0";

/// A portable snapshot of one user's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Format version, currently [`BACKUP_VERSION`].
    pub version: String,
    /// When the snapshot was taken.
    pub export_date: DateTime<Utc>,
    /// Habits in creation order.
    #[serde(default)]
    pub habits: Vec<HabitView>,
    /// Profile.
    pub profile: ProfileView,
}

/// Validated data ready to replace a user's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    /// Habits owned by the importing user.
    pub habits: Vec<Habit>,
    /// Profile owned by the importing user.
    pub profile: Profile,
}

impl Backup {
    /// Snapshot a user's habits and profile.
    #[must_use]
    pub fn export(habits: &[Habit], profile: &Profile, now: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            export_date: now,
            habits: habits.iter().map(Habit::to_view).collect(),
            profile: profile.to_view(),
        }
    }

    /// Validate the backup and rebuild state for `user_id`.
    ///
    /// Streaks are recomputed from the completion history and the best streak
    /// is kept at least as high as the imported one. Level and in-level XP are
    /// derived from lifetime XP, and badges implied by lifetime XP are added
    /// to the imported ones. Habit IDs repeated within the backup get fresh
    /// IDs.
    ///
    /// # Errors
    ///
    /// Returns [`HabitError::InvalidBackup`] for an unknown version, or a
    /// validation error for a bad habit or profile field. Nothing is returned
    /// unless every entry is valid.
    pub fn restore(self, user_id: &UserId) -> Result<Restored> {
        if self.version != BACKUP_VERSION {
            return Err(HabitError::InvalidBackup(format!(
                "unsupported version {:?} (expected {BACKUP_VERSION:?})",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        let mut habits = Vec::with_capacity(self.habits.len());
        for view in self.habits {
            let input = NewHabit::parse(&view.name, view.description.as_deref())?;
            let mut habit = Habit::from_view(user_id.clone(), view);
            habit.name = input.name;
            habit.description = input.description;
            if !seen.insert(habit.id) {
                habit.id = HabitId::generate();
                seen.insert(habit.id);
            }
            refresh_streaks(&mut habit);
            habits.push(habit);
        }

        let mut profile = Profile::new(user_id.clone());
        profile.apply_update(&ProfileUpdate {
            name: Some(self.profile.name),
            avatar: self.profile.avatar,
        })?;
        profile.total_xp = self.profile.total_xp;
        profile.level = level_for_total_xp(profile.total_xp);
        profile.xp = xp_into_level(profile.total_xp);
        for badge in self.profile.badges {
            if !profile.has_badge(badge) {
                profile.badges.push(badge);
            }
        }
        unlock_badges(&mut profile);

        Ok(Restored { habits, profile })
    }
}
