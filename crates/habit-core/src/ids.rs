//! Identifier types for the habit tracker.
//!
//! - [`UserId`] is an opaque subject string handed over by the identity provider.
//! - [`HabitId`] is a ULID assigned by the store, so habits sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use ulid::{Generator, Ulid};

/// Shared across the process so IDs minted in the same millisecond still
/// increase.
static HABIT_ID_GENERATOR: Mutex<Generator> = Mutex::new(Generator::new());

/// Maximum length in bytes of a user identifier.
pub const MAX_USER_ID_LEN: usize = 128;

/// A user identifier.
///
/// User IDs come from the identity provider (the JWT `sub` claim) and are
/// trusted as-is. The only checks are structural: non-empty, bounded length,
/// and no control characters, so the ID is safe to embed in storage keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user ID, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidUserId`] if the ID is empty, too long, or
    /// contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_USER_ID_LEN || id.chars().any(char::is_control) {
            return Err(IdError::InvalidUserId);
        }
        Ok(Self(id))
    }

    /// Generate a new random user ID (primarily for testing).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Return the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the raw bytes of the ID.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// A habit identifier using ULID for time-ordering.
///
/// Habit IDs are assigned on creation; their timestamp prefix makes a user's
/// habits list in the order they were created.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HabitId(Ulid);

impl HabitId {
    /// Generate a new `HabitId` with the current timestamp.
    ///
    /// IDs are strictly increasing within the process, including several
    /// generated in the same millisecond.
    #[must_use]
    pub fn generate() -> Self {
        let mut generator = HABIT_ID_GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Overflow needs 2^80 IDs in one millisecond.
        Self(generator.generate().unwrap_or_else(|_| Ulid::new()))
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }
}

impl FromStr for HabitId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HabitId({})", self.0)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for HabitId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HabitId> for String {
    fn from(id: HabitId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a usable user identifier.
    #[error("invalid user ID")]
    InvalidUserId,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_provider_subjects() {
        let id = UserId::new("fb-uid-AbC123").unwrap();
        assert_eq!(id.as_str(), "fb-uid-AbC123");
        assert_eq!(id.to_string(), "fb-uid-AbC123");
    }

    #[test]
    fn user_id_rejects_bad_shapes() {
        assert_eq!(UserId::new(""), Err(IdError::InvalidUserId));
        assert_eq!(UserId::new("a\nb"), Err(IdError::InvalidUserId));
        assert_eq!(
            UserId::new("x".repeat(MAX_USER_ID_LEN + 1)),
            Err(IdError::InvalidUserId)
        );
    }

    #[test]
    fn user_id_serde_rejects_empty() {
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
        let id: UserId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn habit_id_parse_and_display() {
        let id = HabitId::generate();
        let parsed = HabitId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(HabitId::from_str("not-a-ulid"), Err(IdError::InvalidUlid));
    }

    #[test]
    fn habit_ids_sort_by_creation() {
        let first = HabitId::generate();
        let second = HabitId::generate();
        assert!(first < second);
        assert!(first.to_bytes() < second.to_bytes());
    }

    #[test]
    fn habit_ids_increase_within_one_millisecond() {
        let ids: Vec<HabitId> = (0..1000).map(|_| HabitId::generate()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn habit_ids_increase_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..250).map(|_| HabitId::generate()).collect::<Vec<_>>())
            })
            .collect();
        let mut all = Vec::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
