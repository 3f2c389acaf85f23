//! User profile types.
//!
//! This module defines the per-user progression record: level, XP within the
//! level, lifetime XP and earned badges, plus display fields.

use serde::{Deserialize, Serialize};

use crate::badge::Badge;
use crate::error::{HabitError, Result};
use crate::habit::validate_name;
use crate::progression::{level_for_total_xp, xp_into_level};
use crate::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Display name given to new profiles.
pub const DEFAULT_PROFILE_NAME: &str = "Habit Hero";

/// Level every profile starts at.
pub const STARTING_LEVEL: u32 = 1;

/// Maximum avatar reference length (URL or emoji) in characters.
pub const MAX_AVATAR_CHARS: usize = 2048;

/// Progression state for one user.
///
/// `xp` is progress within the current level (`0..XP_PER_LEVEL`),
/// `total_xp` is lifetime XP and never decreases, and `badges` is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// The user this profile belongs to.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Current level, starting at 1.
    pub level: u32,

    /// XP within the current level.
    pub xp: u32,

    /// Lifetime XP.
    pub total_xp: u64,

    /// Earned badges in unlock order.
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl Profile {
    /// Create a default profile for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: DEFAULT_PROFILE_NAME.to_string(),
            avatar: None,
            level: STARTING_LEVEL,
            xp: 0,
            total_xp: 0,
            badges: Vec::new(),
        }
    }

    /// Check whether the profile holds a badge.
    #[must_use]
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    /// Check that `level` and `xp` agree with `total_xp` under the closed form
    /// `level = total_xp / 100 + 1`, `xp = total_xp % 100`.
    ///
    /// Profiles only ever advanced through [`crate::progression::award_xp`]
    /// always pass; a failure points at state written by some other path.
    #[must_use]
    pub fn is_progression_consistent(&self) -> bool {
        self.level == level_for_total_xp(self.total_xp) && self.xp == xp_into_level(self.total_xp)
    }

    /// Apply a display-field update.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the new name is empty or too long, or the
    /// avatar is too long. The profile is unchanged on error.
    pub fn apply_update(&mut self, update: &ProfileUpdate) -> Result<()> {
        let name = update
            .name
            .as_deref()
            .map(|n| validate_name("profile name", n))
            .transpose()?;

        let avatar = match update.avatar.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(a) => {
                let len = a.chars().count();
                if len > MAX_AVATAR_CHARS {
                    return Err(HabitError::TooLong {
                        field: "avatar",
                        len,
                        max: MAX_AVATAR_CHARS,
                    });
                }
                Some(Some(a.to_string()))
            }
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(avatar) = avatar {
            self.avatar = avatar;
        }
        Ok(())
    }

    /// Convert to the interchange shape (drops the owner).
    #[must_use]
    pub fn to_view(&self) -> ProfileView {
        ProfileView {
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            level: self.level,
            xp: self.xp,
            total_xp: self.total_xp,
            badges: self.badges.clone(),
        }
    }
}

/// The profile shape exchanged with HTTP clients and the offline fallback.
///
/// ```text
/// { name, avatar?, level, xp, totalXp, badges: [string] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// Display name.
    pub name: String,
    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Current level.
    pub level: u32,
    /// XP within the current level.
    pub xp: u32,
    /// Lifetime XP.
    pub total_xp: u64,
    /// Earned badge identifiers.
    #[serde(default)]
    pub badges: Vec<Badge>,
}

/// Editable profile fields.
///
/// `None` leaves a field untouched; an empty avatar string clears the avatar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar, or `""` to clear it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
