//! In-memory storage implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use habit_core::{Habit, HabitId, Profile, UserId};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, Default)]
struct UserData {
    habits: BTreeMap<HabitId, Habit>,
    profile: Option<Profile>,
}

/// A [`Store`] kept entirely in memory.
///
/// Habits are ordered by ID, which for ULIDs is creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserData>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, UserData>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, UserData>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn put_habit(&self, habit: &Habit) -> Result<()> {
        self.write()
            .entry(habit.user_id.clone())
            .or_default()
            .habits
            .insert(habit.id, habit.clone());
        Ok(())
    }

    fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<Option<Habit>> {
        Ok(self
            .read()
            .get(user_id)
            .and_then(|data| data.habits.get(habit_id))
            .cloned())
    }

    fn list_habits(&self, user_id: &UserId) -> Result<Vec<Habit>> {
        Ok(self
            .read()
            .get(user_id)
            .map(|data| data.habits.values().cloned().collect())
            .unwrap_or_default())
    }

    fn delete_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<()> {
        self.write()
            .get_mut(user_id)
            .and_then(|data| data.habits.remove(habit_id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                entity: "habit",
                id: habit_id.to_string(),
            })
    }

    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        Ok(self
            .read()
            .get(user_id)
            .and_then(|data| data.profile.clone()))
    }

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.write()
            .entry(profile.user_id.clone())
            .or_default()
            .profile = Some(profile.clone());
        Ok(())
    }

    fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile> {
        let mut users = self.write();
        let data = users.entry(profile.user_id.clone()).or_default();
        Ok(data.profile.get_or_insert_with(|| profile.clone()).clone())
    }

    fn replace_user_data(
        &self,
        user_id: &UserId,
        habits: &[Habit],
        profile: &Profile,
    ) -> Result<()> {
        let data = UserData {
            habits: habits.iter().map(|h| (h.id, h.clone())).collect(),
            profile: Some(profile.clone()),
        };
        self.write().insert(user_id.clone(), data);
        Ok(())
    }

    fn delete_user_data(&self, user_id: &UserId) -> Result<()> {
        self.write().remove(user_id);
        Ok(())
    }
}
