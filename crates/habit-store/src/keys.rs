//! Key encoding utilities for `RocksDB`.
//!
//! User IDs are variable-length strings, so every key starts with a one-byte
//! length followed by the user ID bytes. That keeps one user's prefix from
//! ever being a prefix of another user's keys.

use habit_core::{HabitId, UserId};

/// Encode the per-user key prefix: `len (1 byte) || user_id bytes`.
///
/// Also used as the profile key.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // UserId is at most MAX_USER_ID_LEN bytes
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let bytes = user_id.as_bytes();
    let mut key = Vec::with_capacity(1 + bytes.len() + 16);
    key.push(bytes.len() as u8);
    key.extend_from_slice(bytes);
    key
}

/// Create a profile key.
#[must_use]
pub fn profile_key(user_id: &UserId) -> Vec<u8> {
    user_prefix(user_id)
}

/// Create a habit key.
///
/// Format: `user_prefix || habit_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's habits iterate in creation order.
#[must_use]
pub fn habit_key(user_id: &UserId, habit_id: &HabitId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(&habit_id.to_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn habit_key_format() {
        let user = UserId::new("user-1").unwrap();
        let habit = HabitId::generate();
        let key = habit_key(&user, &habit);

        assert_eq!(key.len(), 1 + 6 + 16);
        assert_eq!(key[0], 6);
        assert_eq!(&key[1..7], b"user-1");
        assert!(key.starts_with(&user_prefix(&user)));
    }

    #[test]
    fn user_prefixes_do_not_nest() {
        let short = UserId::new("ab").unwrap();
        let long = UserId::new("abc").unwrap();
        let habit = HabitId::generate();
        assert!(!habit_key(&long, &habit).starts_with(&user_prefix(&short)));
    }
}
