//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use habit_core::{Habit, HabitId, Profile, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::KeyedLocks;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes the read-then-write of `insert_profile_if_absent` per user.
    profile_inserts: KeyedLocks<UserId>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            profile_inserts: KeyedLocks::new(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Collect the keys of every habit belonging to a user.
    fn habit_keys(&self, user_id: &UserId) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf(cf::HABITS)?;
        let prefix = keys::user_prefix(user_id);

        let mut found = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            found.push(key);
        }
        Ok(found)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Habit Operations
    // =========================================================================

    fn put_habit(&self, habit: &Habit) -> Result<()> {
        let cf = self.cf(cf::HABITS)?;
        let key = keys::habit_key(&habit.user_id, &habit.id);
        let value = Self::serialize(habit)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<Option<Habit>> {
        let cf = self.cf(cf::HABITS)?;
        let key = keys::habit_key(user_id, habit_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_habits(&self, user_id: &UserId) -> Result<Vec<Habit>> {
        let cf = self.cf(cf::HABITS)?;
        let prefix = keys::user_prefix(user_id);

        let mut habits = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            habits.push(Self::deserialize(&value)?);
        }

        Ok(habits)
    }

    fn delete_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<()> {
        let cf = self.cf(cf::HABITS)?;
        let key = keys::habit_key(user_id, habit_id);

        // Check if habit exists
        if self.get_habit(user_id, habit_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "habit",
                id: habit_id.to_string(),
            });
        }

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(&profile.user_id);
        let value = Self::serialize(profile)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn insert_profile_if_absent(&self, profile: &Profile) -> Result<Profile> {
        self.profile_inserts.with_lock(&profile.user_id, || {
            if let Some(existing) = self.get_profile(&profile.user_id)? {
                return Ok(existing);
            }

            self.put_profile(profile)?;
            tracing::debug!(user_id = %profile.user_id, "Profile created");
            Ok(profile.clone())
        })
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    fn replace_user_data(
        &self,
        user_id: &UserId,
        habits: &[Habit],
        profile: &Profile,
    ) -> Result<()> {
        let cf_habits = self.cf(cf::HABITS)?;
        let cf_profiles = self.cf(cf::PROFILES)?;

        let mut batch = WriteBatch::default();
        for key in self.habit_keys(user_id)? {
            batch.delete_cf(&cf_habits, key);
        }
        for habit in habits {
            let key = keys::habit_key(user_id, &habit.id);
            batch.put_cf(&cf_habits, key, Self::serialize(habit)?);
        }
        batch.put_cf(
            &cf_profiles,
            keys::profile_key(user_id),
            Self::serialize(profile)?,
        );

        // Write atomically
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete_user_data(&self, user_id: &UserId) -> Result<()> {
        let cf_habits = self.cf(cf::HABITS)?;
        let cf_profiles = self.cf(cf::PROFILES)?;

        let mut batch = WriteBatch::default();
        for key in self.habit_keys(user_id)? {
            batch.delete_cf(&cf_habits, key);
        }
        batch.delete_cf(&cf_profiles, keys::profile_key(user_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::NewHabit;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn new_habit(name: &str) -> NewHabit {
        NewHabit::parse(name, None).unwrap()
    }

    #[test]
    fn habit_crud() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        // Create
        let mut habit = store.create_habit(&user_id, new_habit("Floss")).unwrap();

        // Read
        let retrieved = store.get_habit(&user_id, &habit.id).unwrap().unwrap();
        assert_eq!(retrieved, habit);

        // Update
        habit.completed_dates.insert("2024-01-01".parse().unwrap());
        habit.current_streak = 1;
        habit.best_streak = 1;
        store.put_habit(&habit).unwrap();
        let updated = store.get_habit(&user_id, &habit.id).unwrap().unwrap();
        assert_eq!(updated.completed_dates.len(), 1);

        // Delete
        store.delete_habit(&user_id, &habit.id).unwrap();
        assert!(store.get_habit(&user_id, &habit.id).unwrap().is_none());
        assert!(matches!(
            store.delete_habit(&user_id, &habit.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_habits_in_creation_order_per_user() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::new("ab").unwrap();
        let other = UserId::new("abc").unwrap();

        let created: Vec<HabitId> = (0..200)
            .map(|i| {
                store
                    .create_habit(&user_id, new_habit(&format!("Habit {i}")))
                    .unwrap()
                    .id
            })
            .collect();
        store.create_habit(&other, new_habit("Other")).unwrap();

        let listed: Vec<HabitId> = store
            .list_habits(&user_id)
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(listed, created);
    }

    #[test]
    fn profile_insert_if_absent() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let mut profile = Profile::new(user_id.clone());
        profile.total_xp = 30;
        profile.xp = 30;
        store.put_profile(&profile).unwrap();

        let kept = store
            .insert_profile_if_absent(&Profile::new(user_id.clone()))
            .unwrap();
        assert_eq!(kept.total_xp, 30);
    }

    #[test]
    fn concurrent_profile_inserts_keep_one_profile() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let user_id = UserId::generate();

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let store = Arc::clone(&store);
                let user_id = user_id.clone();
                std::thread::spawn(move || {
                    let mut profile = Profile::new(user_id);
                    profile.total_xp = i;
                    store.insert_profile_if_absent(&profile).unwrap()
                })
            })
            .collect();
        let results: Vec<Profile> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let stored = store.get_profile(&user_id).unwrap().unwrap();
        assert!(results.iter().all(|p| *p == stored));
    }

    #[test]
    fn profile_insert_does_not_wait_on_other_users() {
        let (store, _dir) = create_test_store();
        let busy = UserId::generate();
        let other = UserId::generate();

        let created = store.profile_inserts.with_lock(&busy, || {
            store.insert_profile_if_absent(&Profile::new(other.clone()))
        });

        assert_eq!(created.unwrap().user_id, other);
    }

    #[test]
    fn replace_and_delete_user_data() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let old = store.create_habit(&user_id, new_habit("Old")).unwrap();

        let replacement = Habit::new(
            HabitId::generate(),
            user_id.clone(),
            new_habit("New"),
            chrono::Utc::now(),
        );
        store
            .replace_user_data(&user_id, &[replacement.clone()], &Profile::new(user_id.clone()))
            .unwrap();

        assert!(store.get_habit(&user_id, &old.id).unwrap().is_none());
        assert_eq!(store.list_habits(&user_id).unwrap(), vec![replacement]);

        store.delete_user_data(&user_id).unwrap();
        assert!(store.list_habits(&user_id).unwrap().is_empty());
        assert!(store.get_profile(&user_id).unwrap().is_none());
    }
}
