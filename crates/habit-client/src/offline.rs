//! Guest-mode fallback that keeps habits in a local file.
//!
//! [`OfflineTracker`] runs the same `habit_core` progression functions as
//! the server and persists state as a [`Backup`] document, so a guest's file
//! can later be imported into an account unchanged.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use habit_core::progression::{self, Completion};
use habit_core::{
    Backup, Habit, HabitId, NewHabit, Profile, ProfileUpdate, ProgressSummary, Restored, UserId,
};

use crate::error::ClientError;

/// User ID under which guest data is kept.
pub const GUEST_USER_ID: &str = "guest";

struct State {
    habits: Vec<Habit>,
    profile: Profile,
}

/// Habit tracking backed by a local JSON file.
///
/// Operations are serialized by an internal lock and each successful
/// mutation rewrites the file before returning.
pub struct OfflineTracker {
    path: PathBuf,
    user_id: UserId,
    state: Mutex<State>,
}

impl OfflineTracker {
    /// Open the data file at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a valid
    /// backup document.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let user_id = UserId::new(GUEST_USER_ID)
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let backup: Backup = serde_json::from_slice(&bytes)?;
                let Restored { habits, profile } = backup.restore(&user_id)?;
                tracing::debug!(
                    path = %path.display(),
                    habits = habits.len(),
                    "Loaded offline data"
                );
                State { habits, profile }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State {
                habits: Vec::new(),
                profile: Profile::new(user_id.clone()),
            },
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            user_id,
            state: Mutex::new(state),
        })
    }

    /// Path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &State) -> Result<(), ClientError> {
        let backup = Backup::export(&state.habits, &state.profile, Utc::now());
        let json = serde_json::to_vec_pretty(&backup)?;

        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn position(state: &State, habit_id: &HabitId) -> Result<usize, ClientError> {
        state
            .habits
            .iter()
            .position(|h| h.id == *habit_id)
            .ok_or(ClientError::HabitNotFound {
                habit_id: *habit_id,
            })
    }

    // =========================================================================
    // Habits
    // =========================================================================

    /// List habits in creation order.
    pub async fn list_habits(&self) -> Vec<Habit> {
        self.state.lock().await.habits.clone()
    }

    /// Create a habit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Invalid`] for an empty name or an over-long
    /// field (nothing changes), or an I/O error.
    pub async fn create_habit(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Habit, ClientError> {
        let new = NewHabit::parse(name, description)?;
        let habit = Habit::new(HabitId::generate(), self.user_id.clone(), new, Utc::now());

        let mut state = self.state.lock().await;
        state.habits.push(habit.clone());
        if let Err(e) = self.persist(&state).await {
            state.habits.pop();
            return Err(e);
        }
        Ok(habit)
    }

    /// Delete a habit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HabitNotFound`] if there is no such habit.
    pub async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        let index = Self::position(&state, habit_id)?;
        let removed = state.habits.remove(index);
        if let Err(e) = self.persist(&state).await {
            state.habits.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Mark a habit completed on `today` and award progression.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HabitNotFound`] if there is no such habit, or
    /// an I/O error (in which case nothing changes).
    pub async fn complete_habit(
        &self,
        habit_id: &HabitId,
        today: NaiveDate,
    ) -> Result<Completion, ClientError> {
        let mut state = self.state.lock().await;
        let index = Self::position(&state, habit_id)?;

        let completion =
            progression::complete_habit(state.habits[index].clone(), state.profile.clone(), today);
        if completion.is_already_completed() {
            return Ok(completion);
        }

        let previous_habit = std::mem::replace(&mut state.habits[index], completion.habit.clone());
        let previous_profile = std::mem::replace(&mut state.profile, completion.profile.clone());
        if let Err(e) = self.persist(&state).await {
            state.habits[index] = previous_habit;
            state.profile = previous_profile;
            return Err(e);
        }
        Ok(completion)
    }

    /// Clear a habit's completions and current streak.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HabitNotFound`] if there is no such habit.
    pub async fn reset_habit(&self, habit_id: &HabitId) -> Result<Habit, ClientError> {
        let mut state = self.state.lock().await;
        let index = Self::position(&state, habit_id)?;

        let mut habit = state.habits[index].clone();
        progression::reset_habit(&mut habit);
        let previous = std::mem::replace(&mut state.habits[index], habit.clone());
        if let Err(e) = self.persist(&state).await {
            state.habits[index] = previous;
            return Err(e);
        }
        Ok(habit)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// The guest profile.
    pub async fn profile(&self) -> Profile {
        self.state.lock().await.profile.clone()
    }

    /// Edit the profile's name or avatar.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Invalid`] for a bad name or avatar.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ClientError> {
        let mut state = self.state.lock().await;
        let mut profile = state.profile.clone();
        profile.apply_update(update)?;

        let previous = std::mem::replace(&mut state.profile, profile.clone());
        if let Err(e) = self.persist(&state).await {
            state.profile = previous;
            return Err(e);
        }
        Ok(profile)
    }

    /// Delete every habit and reset the profile.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the data file cannot be removed.
    pub async fn reset_all(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        state.habits.clear();
        state.profile = Profile::new(self.user_id.clone());
        Ok(())
    }

    // =========================================================================
    // Progress and backups
    // =========================================================================

    /// Summarize progress as of `today`.
    pub async fn progress(&self, today: NaiveDate) -> ProgressSummary {
        ProgressSummary::compute(&self.state.lock().await.habits, today)
    }

    /// Snapshot habits and profile, e.g. to import into an account.
    pub async fn export(&self, now: DateTime<Utc>) -> Backup {
        let state = self.state.lock().await;
        Backup::export(&state.habits, &state.profile, now)
    }

    /// Replace habits and profile with a backup.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Invalid`] if any part of the backup is invalid
    /// (nothing changes), or an I/O error.
    pub async fn import(&self, backup: Backup) -> Result<(), ClientError> {
        let Restored { habits, profile } = backup.restore(&self.user_id)?;

        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, State { habits, profile });
        if let Err(e) = self.persist(&state).await {
            *state = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use habit_core::{Badge, HabitError};
    use tempfile::TempDir;

    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn open_in(dir: &TempDir) -> OfflineTracker {
        OfflineTracker::open(dir.path().join("habits.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn starts_empty_with_default_profile() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;

        assert!(tracker.list_habits().await.is_empty());
        let profile = tracker.profile().await;
        assert_eq!(profile.level, 1);
        assert_eq!(profile.total_xp, 0);
        assert!(!tracker.path().exists());
    }

    #[tokio::test]
    async fn completions_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;
        let habit = tracker.create_habit("Read", None).await.unwrap();

        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            tracker.complete_habit(&habit.id, day(d)).await.unwrap();
        }
        drop(tracker);

        let reopened = open_in(&dir).await;
        let habits = reopened.list_habits().await;
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, habit.id);
        assert_eq!(habits[0].current_streak, 3);
        assert_eq!(habits[0].best_streak, 3);
        assert_eq!(reopened.profile().await.total_xp, 30);
    }

    #[tokio::test]
    async fn matches_engine_results() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;
        let habit = tracker.create_habit("Run", None).await.unwrap();

        let offline = tracker
            .complete_habit(&habit.id, day("2024-02-10"))
            .await
            .unwrap();
        let engine = progression::complete_habit(
            habit.clone(),
            Profile::new(UserId::new(GUEST_USER_ID).unwrap()),
            day("2024-02-10"),
        );

        assert_eq!(offline, engine);

        let again = tracker
            .complete_habit(&habit.id, day("2024-02-10"))
            .await
            .unwrap();
        assert!(again.is_already_completed());
        assert_eq!(again.profile, offline.profile);
    }

    #[tokio::test]
    async fn unknown_habit_and_empty_name_are_errors() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;

        assert!(matches!(
            tracker
                .complete_habit(&HabitId::generate(), day("2024-01-01"))
                .await,
            Err(ClientError::HabitNotFound { .. })
        ));
        assert!(matches!(
            tracker.create_habit("", None).await,
            Err(ClientError::Invalid(HabitError::EmptyName { .. }))
        ));
    }

    #[tokio::test]
    async fn reset_keeps_best_streak() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;
        let habit = tracker.create_habit("Walk", None).await.unwrap();
        tracker
            .complete_habit(&habit.id, day("2024-03-01"))
            .await
            .unwrap();

        let reset = tracker.reset_habit(&habit.id).await.unwrap();
        assert!(reset.completed_dates.is_empty());
        assert_eq!(reset.current_streak, 0);
        assert_eq!(reset.best_streak, 1);
        assert_eq!(tracker.profile().await.total_xp, 10);
    }

    #[tokio::test]
    async fn export_import_and_reset_all() {
        let dir = TempDir::new().unwrap();
        let tracker = open_in(&dir).await;
        let habit = tracker.create_habit("Stretch", None).await.unwrap();
        tracker
            .complete_habit(&habit.id, day("2024-04-01"))
            .await
            .unwrap();
        let backup = tracker.export(Utc::now()).await;

        tracker.reset_all().await.unwrap();
        assert!(tracker.list_habits().await.is_empty());
        assert!(!tracker.path().exists());

        let mut boosted = backup.clone();
        boosted.profile.total_xp = 1000;
        tracker.import(boosted).await.unwrap();
        let profile = tracker.profile().await;
        assert_eq!(profile.level, 11);
        assert_eq!(profile.xp, 0);
        assert_eq!(
            profile.badges,
            vec![Badge::Bronze, Badge::Silver, Badge::Gold, Badge::Diamond]
        );
        assert_eq!(tracker.list_habits().await[0].id, habit.id);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("habits.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        assert!(matches!(
            OfflineTracker::open(&path).await,
            Err(ClientError::Serialization(_))
        ));
    }
}
