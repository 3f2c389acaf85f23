//! Progression operations as serialized read-modify-write transactions.
//!
//! Every mutation of a habit runs under that habit's lock, then the owner's
//! lock. Locks are always taken in that order, so two-lock paths cannot
//! deadlock. The user lock also covers bulk writes (import, reset of all
//! data), which keeps a completion from resurrecting a habit that an import
//! just replaced.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use habit_core::progression::{self, Completion};
use habit_core::{
    Backup, Habit, HabitId, NewHabit, Profile, ProfileUpdate, ProgressSummary, Restored, UserId,
};

use crate::error::{StoreError, TrackerError};
use crate::locks::KeyedLocks;
use crate::Store;

/// Result type for tracker operations.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

/// Runs habit and profile operations against a [`Store`].
pub struct Tracker {
    store: Arc<dyn Store>,
    habit_locks: KeyedLocks<(UserId, HabitId)>,
    user_locks: KeyedLocks<UserId>,
}

impl Tracker {
    /// Create a tracker over a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            habit_locks: KeyedLocks::new(),
            user_locks: KeyedLocks::new(),
        }
    }

    fn with_habit_lock<R>(
        &self,
        user_id: &UserId,
        habit_id: &HabitId,
        f: impl FnOnce() -> R,
    ) -> R {
        let key = (user_id.clone(), *habit_id);
        self.habit_locks
            .with_lock(&key, || self.user_locks.with_lock(user_id, f))
    }

    fn find_habit(&self, user_id: &UserId, habit_id: &HabitId) -> TrackerResult<Habit> {
        self.store
            .get_habit(user_id, habit_id)?
            .ok_or(TrackerError::HabitNotFound {
                habit_id: *habit_id,
            })
    }

    // =========================================================================
    // Habits
    // =========================================================================

    /// Create a habit for a user.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Invalid` if the name is empty or a field is too
    /// long (nothing is written), or a store error.
    pub fn create_habit(
        &self,
        user_id: &UserId,
        name: &str,
        description: Option<&str>,
    ) -> TrackerResult<Habit> {
        let new = NewHabit::parse(name, description)?;
        let habit = self
            .user_locks
            .with_lock(user_id, || self.store.create_habit(user_id, new))?;

        info!(user_id = %user_id, habit_id = %habit.id, "Habit created");
        Ok(habit)
    }

    /// List a user's habits in creation order.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn list_habits(&self, user_id: &UserId) -> TrackerResult<Vec<Habit>> {
        Ok(self.store.list_habits(user_id)?)
    }

    /// Get one habit.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::HabitNotFound` if the user has no such habit.
    pub fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> TrackerResult<Habit> {
        self.find_habit(user_id, habit_id)
    }

    /// Delete a habit. The profile is untouched.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::HabitNotFound` if the user has no such habit.
    pub fn delete_habit(&self, user_id: &UserId, habit_id: &HabitId) -> TrackerResult<()> {
        self.with_habit_lock(user_id, habit_id, || {
            match self.store.delete_habit(user_id, habit_id) {
                Ok(()) => Ok(()),
                Err(StoreError::NotFound { .. }) => Err(TrackerError::HabitNotFound {
                    habit_id: *habit_id,
                }),
                Err(e) => Err(e.into()),
            }
        })?;

        info!(user_id = %user_id, habit_id = %habit_id, "Habit deleted");
        Ok(())
    }

    /// Mark a habit completed on `today` and award progression.
    ///
    /// Completing a day that is already recorded is not an error: the
    /// returned [`Completion`] reports it and nothing is written.
    ///
    /// # Errors
    ///
    /// - `TrackerError::HabitNotFound` if the user has no such habit
    /// - `TrackerError::Store` if reading or saving the habit failed
    /// - `TrackerError::ProfileOutOfSync` if the habit was saved but the
    ///   profile was not
    pub fn complete_habit(
        &self,
        user_id: &UserId,
        habit_id: &HabitId,
        today: NaiveDate,
    ) -> TrackerResult<Completion> {
        self.with_habit_lock(user_id, habit_id, || {
            let habit = self.find_habit(user_id, habit_id)?;
            let profile = self.load_or_create_profile(user_id)?;

            let completion = progression::complete_habit(habit, profile, today);
            let Some(award) = completion.award() else {
                debug!(user_id = %user_id, habit_id = %habit_id, %today, "Already completed");
                return Ok(completion);
            };

            self.store.put_habit(&completion.habit)?;
            if let Err(source) = self.store.put_profile(&completion.profile) {
                warn!(
                    user_id = %user_id,
                    habit_id = %habit_id,
                    error = %source,
                    "Habit saved but profile update failed"
                );
                return Err(TrackerError::ProfileOutOfSync {
                    habit: Box::new(completion.habit),
                    source,
                });
            }

            info!(
                user_id = %user_id,
                habit_id = %habit_id,
                %today,
                streak = completion.habit.current_streak,
                xp_gained = award.xp_gained,
                levels_gained = award.levels_gained,
                new_badges = award.new_badges.len(),
                "Habit completed"
            );
            Ok(completion)
        })
    }

    /// Clear a habit's completions and current streak.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::HabitNotFound` if the user has no such habit,
    /// or a store error.
    pub fn reset_habit(&self, user_id: &UserId, habit_id: &HabitId) -> TrackerResult<Habit> {
        self.with_habit_lock(user_id, habit_id, || {
            let mut habit = self.find_habit(user_id, habit_id)?;
            progression::reset_habit(&mut habit);
            self.store.put_habit(&habit)?;

            info!(user_id = %user_id, habit_id = %habit_id, "Habit reset");
            Ok(habit)
        })
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get a user's profile, creating the default one on first access.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn get_or_create_profile(&self, user_id: &UserId) -> TrackerResult<Profile> {
        self.load_or_create_profile(user_id)
    }

    fn load_or_create_profile(&self, user_id: &UserId) -> TrackerResult<Profile> {
        let profile = match self.store.get_profile(user_id)? {
            Some(profile) => profile,
            None => self
                .store
                .insert_profile_if_absent(&Profile::new(user_id.clone()))?,
        };

        if !profile.is_progression_consistent() {
            warn!(
                user_id = %user_id,
                level = profile.level,
                xp = profile.xp,
                total_xp = profile.total_xp,
                "Stored level and XP disagree with lifetime XP"
            );
        }
        Ok(profile)
    }

    /// Edit a profile's display fields.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Invalid` for a bad name or avatar (nothing is
    /// written), or a store error.
    pub fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> TrackerResult<Profile> {
        self.user_locks.with_lock(user_id, || {
            let mut profile = self.load_or_create_profile(user_id)?;
            profile.apply_update(update)?;
            self.store.put_profile(&profile)?;

            debug!(user_id = %user_id, "Profile updated");
            Ok(profile)
        })
    }

    /// Delete every habit of a user and their profile.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn reset_all(&self, user_id: &UserId) -> TrackerResult<()> {
        self.user_locks
            .with_lock(user_id, || self.store.delete_user_data(user_id))?;

        info!(user_id = %user_id, "All user data reset");
        Ok(())
    }

    // =========================================================================
    // Progress and backups
    // =========================================================================

    /// Summarize a user's progress as of `today`.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn progress(&self, user_id: &UserId, today: NaiveDate) -> TrackerResult<ProgressSummary> {
        let habits = self.store.list_habits(user_id)?;
        Ok(ProgressSummary::compute(&habits, today))
    }

    /// Snapshot a user's habits and profile.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn export(&self, user_id: &UserId, now: DateTime<Utc>) -> TrackerResult<Backup> {
        self.user_locks.with_lock(user_id, || {
            let habits = self.store.list_habits(user_id)?;
            let profile = self.load_or_create_profile(user_id)?;
            Ok(Backup::export(&habits, &profile, now))
        })
    }

    /// Replace a user's habits and profile with a backup.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Invalid` if any part of the backup is invalid
    /// (nothing is written), or a store error.
    pub fn import(&self, user_id: &UserId, backup: Backup) -> TrackerResult<Restored> {
        let restored = backup.restore(user_id)?;
        self.user_locks.with_lock(user_id, || {
            self.store
                .replace_user_data(user_id, &restored.habits, &restored.profile)
        })?;

        info!(
            user_id = %user_id,
            habits = restored.habits.len(),
            total_xp = restored.profile.total_xp,
            "Backup imported"
        );
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use habit_core::{Badge, HabitError};

    use super::*;
    use crate::error::Result as StoreResult;
    use crate::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn tracker() -> Tracker {
        Tracker::new(Arc::new(MemoryStore::new()))
    }

    /// Delegates to a [`MemoryStore`] but can be told to fail profile writes.
    #[derive(Default)]
    struct FlakyProfileStore {
        inner: MemoryStore,
        fail_profile_writes: AtomicBool,
    }

    impl Store for FlakyProfileStore {
        fn put_habit(&self, habit: &Habit) -> StoreResult<()> {
            self.inner.put_habit(habit)
        }
        fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> StoreResult<Option<Habit>> {
            self.inner.get_habit(user_id, habit_id)
        }
        fn list_habits(&self, user_id: &UserId) -> StoreResult<Vec<Habit>> {
            self.inner.list_habits(user_id)
        }
        fn delete_habit(&self, user_id: &UserId, habit_id: &HabitId) -> StoreResult<()> {
            self.inner.delete_habit(user_id, habit_id)
        }
        fn get_profile(&self, user_id: &UserId) -> StoreResult<Option<Profile>> {
            self.inner.get_profile(user_id)
        }
        fn put_profile(&self, profile: &Profile) -> StoreResult<()> {
            if self.fail_profile_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Database("profile write rejected".into()));
            }
            self.inner.put_profile(profile)
        }
        fn insert_profile_if_absent(&self, profile: &Profile) -> StoreResult<Profile> {
            self.inner.insert_profile_if_absent(profile)
        }
        fn replace_user_data(
            &self,
            user_id: &UserId,
            habits: &[Habit],
            profile: &Profile,
        ) -> StoreResult<()> {
            self.inner.replace_user_data(user_id, habits, profile)
        }
        fn delete_user_data(&self, user_id: &UserId) -> StoreResult<()> {
            self.inner.delete_user_data(user_id)
        }
    }

    #[test]
    fn complete_awards_xp_and_persists() {
        let tracker = tracker();
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", None).unwrap();

        let completion = tracker
            .complete_habit(&user, &habit.id, day("2024-03-01"))
            .unwrap();
        assert_eq!(completion.xp_gained(), 10);
        assert_eq!(completion.habit.current_streak, 1);

        let stored = tracker.get_habit(&user, &habit.id).unwrap();
        assert!(stored.is_completed_on(day("2024-03-01")));
        let profile = tracker.get_or_create_profile(&user).unwrap();
        assert_eq!(profile.total_xp, 10);
        assert_eq!(profile.xp, 10);
    }

    #[test]
    fn repeat_completion_is_a_no_op() {
        let tracker = tracker();
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", None).unwrap();

        let first = tracker
            .complete_habit(&user, &habit.id, day("2024-03-01"))
            .unwrap();
        let second = tracker
            .complete_habit(&user, &habit.id, day("2024-03-01"))
            .unwrap();

        assert!(second.is_already_completed());
        assert_eq!(second.xp_gained(), 0);
        assert_eq!(second.habit, first.habit);
        assert_eq!(second.profile, first.profile);
    }

    #[test]
    fn unknown_habit_is_not_found() {
        let tracker = tracker();
        let user = UserId::generate();
        let missing = HabitId::generate();

        assert!(matches!(
            tracker.complete_habit(&user, &missing, day("2024-03-01")),
            Err(TrackerError::HabitNotFound { habit_id }) if habit_id == missing
        ));
        assert!(matches!(
            tracker.reset_habit(&user, &missing),
            Err(TrackerError::HabitNotFound { .. })
        ));
        assert!(matches!(
            tracker.delete_habit(&user, &missing),
            Err(TrackerError::HabitNotFound { .. })
        ));
    }

    #[test]
    fn other_users_habit_is_not_found() {
        let tracker = tracker();
        let owner = UserId::generate();
        let intruder = UserId::generate();
        let habit = tracker.create_habit(&owner, "Read", None).unwrap();

        assert!(matches!(
            tracker.complete_habit(&intruder, &habit.id, day("2024-03-01")),
            Err(TrackerError::HabitNotFound { .. })
        ));
    }

    #[test]
    fn rapid_creates_list_in_creation_order() {
        let tracker = tracker();
        let user = UserId::generate();
        let names: Vec<String> = (0..500).map(|i| format!("{i:04}")).collect();
        for name in &names {
            tracker.create_habit(&user, name, None).unwrap();
        }

        let listed: Vec<String> = tracker
            .list_habits(&user)
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn empty_name_is_rejected_without_writes() {
        let tracker = tracker();
        let user = UserId::generate();

        assert!(matches!(
            tracker.create_habit(&user, "   ", None),
            Err(TrackerError::Invalid(HabitError::EmptyName { .. }))
        ));
        assert!(tracker.list_habits(&user).unwrap().is_empty());
    }

    #[test]
    fn reset_keeps_best_streak_and_profile() {
        let tracker = tracker();
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", None).unwrap();
        for d in ["2024-03-01", "2024-03-02"] {
            tracker.complete_habit(&user, &habit.id, day(d)).unwrap();
        }

        let reset = tracker.reset_habit(&user, &habit.id).unwrap();
        assert!(reset.completed_dates.is_empty());
        assert_eq!(reset.current_streak, 0);
        assert_eq!(reset.best_streak, 2);
        assert_eq!(tracker.get_or_create_profile(&user).unwrap().total_xp, 20);
    }

    #[test]
    fn profile_write_failure_is_reported_as_out_of_sync() {
        let store = Arc::new(FlakyProfileStore::default());
        let tracker = Tracker::new(store.clone());
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", None).unwrap();
        tracker.get_or_create_profile(&user).unwrap();

        store.fail_profile_writes.store(true, Ordering::SeqCst);
        let err = tracker
            .complete_habit(&user, &habit.id, day("2024-03-01"))
            .unwrap_err();

        match err {
            TrackerError::ProfileOutOfSync { habit: saved, .. } => {
                assert_eq!(saved.id, habit.id);
                assert!(saved.is_completed_on(day("2024-03-01")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.get_profile(&user).unwrap().unwrap().total_xp, 0);
    }

    #[test]
    fn concurrent_completions_of_one_habit_keep_every_date() {
        let tracker = Arc::new(tracker());
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", None).unwrap();
        let start = day("2024-01-01");

        let handles: Vec<_> = (0..20u64)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                let user = user.clone();
                let habit_id = habit.id;
                thread::spawn(move || {
                    let date = start + chrono::Days::new(i);
                    tracker.complete_habit(&user, &habit_id, date).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored = tracker.get_habit(&user, &habit.id).unwrap();
        assert_eq!(stored.completion_count(), 20);
        assert_eq!(stored.current_streak, 20);
        assert_eq!(stored.best_streak, 20);

        let profile = tracker.get_or_create_profile(&user).unwrap();
        assert_eq!(profile.total_xp, 200);
        assert_eq!(profile.level, 3);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.badges, vec![Badge::Bronze]);
    }

    #[test]
    fn concurrent_completions_of_different_habits_lose_no_xp() {
        let tracker = Arc::new(tracker());
        let user = UserId::generate();
        let habits: Vec<_> = (0..8)
            .map(|i| tracker.create_habit(&user, &format!("Habit {i}"), None).unwrap())
            .collect();

        let handles: Vec<_> = habits
            .iter()
            .map(|habit| {
                let tracker = Arc::clone(&tracker);
                let user = user.clone();
                let habit_id = habit.id;
                thread::spawn(move || {
                    tracker
                        .complete_habit(&user, &habit_id, day("2024-05-05"))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(tracker.get_or_create_profile(&user).unwrap().total_xp, 80);
    }

    #[test]
    fn update_profile_validates_atomically() {
        let tracker = tracker();
        let user = UserId::generate();

        let updated = tracker
            .update_profile(
                &user,
                &ProfileUpdate {
                    name: Some("Sam".into()),
                    avatar: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Sam");

        let rejected = tracker.update_profile(
            &user,
            &ProfileUpdate {
                name: Some(String::new()),
                avatar: Some("a.png".into()),
            },
        );
        assert!(matches!(rejected, Err(TrackerError::Invalid(_))));
        let profile = tracker.get_or_create_profile(&user).unwrap();
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.avatar, None);
    }

    #[test]
    fn export_import_round_trip_and_reset_all() {
        let tracker = tracker();
        let user = UserId::generate();
        let habit = tracker.create_habit(&user, "Run", Some("5k")).unwrap();
        tracker
            .complete_habit(&user, &habit.id, day("2024-03-01"))
            .unwrap();

        let backup = tracker.export(&user, Utc::now()).unwrap();
        tracker.reset_all(&user).unwrap();
        assert!(tracker.list_habits(&user).unwrap().is_empty());
        assert_eq!(tracker.get_or_create_profile(&user).unwrap().total_xp, 0);

        let restored = tracker.import(&user, backup).unwrap();
        assert_eq!(restored.habits.len(), 1);
        let habits = tracker.list_habits(&user).unwrap();
        assert_eq!(habits[0].id, habit.id);
        assert_eq!(habits[0].current_streak, 1);
        assert_eq!(tracker.get_or_create_profile(&user).unwrap().total_xp, 10);
    }

    #[test]
    fn invalid_import_changes_nothing() {
        let tracker = tracker();
        let user = UserId::generate();
        tracker.create_habit(&user, "Keep me", None).unwrap();

        let mut backup = tracker.export(&user, Utc::now()).unwrap();
        backup.version = "9.9".into();

        assert!(matches!(
            tracker.import(&user, backup),
            Err(TrackerError::Invalid(HabitError::InvalidBackup(_)))
        ));
        assert_eq!(tracker.list_habits(&user).unwrap().len(), 1);
    }

    #[test]
    fn progress_counts_today() {
        let tracker = tracker();
        let user = UserId::generate();
        let a = tracker.create_habit(&user, "A", None).unwrap();
        tracker.create_habit(&user, "B", None).unwrap();
        tracker.complete_habit(&user, &a.id, day("2024-03-01")).unwrap();

        let summary = tracker.progress(&user, day("2024-03-01")).unwrap();
        assert_eq!(summary.today.completed, 1);
        assert_eq!(summary.today.total, 2);
    }
}
