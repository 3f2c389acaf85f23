//! The progression engine: streaks, XP, levels and badges.
//!
//! Everything here is a pure function of a habit's completion history and a
//! profile. The HTTP path (the store's tracker), the offline client and
//! backup import all call these same functions, so streak and XP rules have
//! exactly one implementation.
//!
//! # Rules
//!
//! - Completing a habit on a day it is already completed on changes nothing.
//! - Otherwise the day is recorded, the streak is recomputed from the whole
//!   history, the best streak is raised if needed, and the profile gains
//!   [`XP_PER_COMPLETION`] XP.
//! - Every [`XP_PER_LEVEL`] XP within a level becomes one level.
//! - Each badge in [`MILESTONES`](crate::MILESTONES) is checked independently against lifetime XP.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::badge::{earned_at, Badge};
use crate::{Habit, Profile};

// ============================================================================
// Constants
// ============================================================================

/// XP awarded for each newly completed day.
pub const XP_PER_COMPLETION: u32 = 10;

/// XP needed to advance one level.
pub const XP_PER_LEVEL: u32 = 100;

/// Count consecutive days ending at the most recent completion.
///
/// Walks the dates from newest to oldest and stops at the first pair that is
/// not exactly one calendar day apart. Differences are computed on
/// [`NaiveDate`], so there is no time-of-day or DST component.
///
/// ```
/// use std::collections::BTreeSet;
/// use habit_core::progression::compute_streak;
///
/// let dates: BTreeSet<chrono::NaiveDate> = ["2024-01-01", "2024-01-02", "2024-01-03"]
///     .iter()
///     .map(|d| d.parse().unwrap())
///     .collect();
/// assert_eq!(compute_streak(&dates), 3);
/// ```
#[must_use]
pub fn compute_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut days = dates.iter().rev();
    let Some(mut newer) = days.next() else {
        return 0;
    };

    let mut streak = 1;
    for older in days {
        if newer.signed_duration_since(*older).num_days() != 1 {
            break;
        }
        streak += 1;
        newer = older;
    }
    streak
}

/// Recompute a habit's current streak and raise its best streak to match.
///
/// The best streak is never lowered.
pub fn refresh_streaks(habit: &mut Habit) {
    habit.current_streak = compute_streak(&habit.completed_dates);
    habit.best_streak = habit.best_streak.max(habit.current_streak);
}

/// Level implied by lifetime XP: `total_xp / 100 + 1`.
#[must_use]
pub fn level_for_total_xp(total_xp: u64) -> u32 {
    u32::try_from(total_xp / u64::from(XP_PER_LEVEL) + 1).unwrap_or(u32::MAX)
}

/// XP within the current level implied by lifetime XP.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // remainder is below XP_PER_LEVEL
pub fn xp_into_level(total_xp: u64) -> u32 {
    (total_xp % u64::from(XP_PER_LEVEL)) as u32
}

/// What an XP award changed on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XpAward {
    /// XP added.
    pub xp_gained: u32,
    /// Levels gained.
    pub levels_gained: u32,
    /// Badges unlocked by this award, in milestone order.
    pub new_badges: Vec<Badge>,
}

/// Add XP to a profile, then apply level-ups and badge unlocks.
pub fn award_xp(profile: &mut Profile, amount: u32) -> XpAward {
    profile.xp = profile.xp.saturating_add(amount);
    profile.total_xp = profile.total_xp.saturating_add(u64::from(amount));

    XpAward {
        xp_gained: amount,
        levels_gained: apply_level_ups(profile),
        new_badges: unlock_badges(profile),
    }
}

/// Convert whole levels of in-level XP into levels.
///
/// Uses the general `level += xp / 100; xp %= 100` form so a single award can
/// cross any number of level boundaries. Returns the number of levels gained.
pub fn apply_level_ups(profile: &mut Profile) -> u32 {
    let gained = profile.xp / XP_PER_LEVEL;
    profile.level = profile.level.saturating_add(gained);
    profile.xp %= XP_PER_LEVEL;
    gained
}

/// Append every badge whose threshold lifetime XP has reached and that the
/// profile does not hold yet. Returns the newly added badges.
///
/// Milestones are checked independently, so one update that jumps across
/// several thresholds unlocks all of them.
pub fn unlock_badges(profile: &mut Profile) -> Vec<Badge> {
    let unlocked: Vec<Badge> = earned_at(profile.total_xp)
        .into_iter()
        .filter(|badge| !profile.has_badge(*badge))
        .collect();
    profile.badges.extend_from_slice(&unlocked);
    unlocked
}

/// Result of [`complete_habit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The habit after the call.
    pub habit: Habit,
    /// The profile after the call.
    pub profile: Profile,
    /// Whether anything changed.
    pub outcome: Outcome,
}

/// Whether a completion changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The day was newly recorded and XP was awarded.
    NewlyCompleted(XpAward),
    /// The day was already recorded; habit and profile are unchanged.
    AlreadyCompleted,
}

impl Completion {
    /// XP actually applied (0 when already completed).
    #[must_use]
    pub fn xp_gained(&self) -> u32 {
        match &self.outcome {
            Outcome::NewlyCompleted(award) => award.xp_gained,
            Outcome::AlreadyCompleted => 0,
        }
    }

    /// Whether the call was a no-op.
    #[must_use]
    pub fn is_already_completed(&self) -> bool {
        matches!(self.outcome, Outcome::AlreadyCompleted)
    }

    /// The XP award, if the day was newly completed.
    #[must_use]
    pub fn award(&self) -> Option<&XpAward> {
        match &self.outcome {
            Outcome::NewlyCompleted(award) => Some(award),
            Outcome::AlreadyCompleted => None,
        }
    }
}

/// Mark `habit` as completed on `today` and progress `profile`.
///
/// `today` is the caller's calendar date and need not be the latest recorded
/// day. If it is already recorded, both inputs come back unchanged with
/// [`Outcome::AlreadyCompleted`].
#[must_use]
pub fn complete_habit(mut habit: Habit, mut profile: Profile, today: NaiveDate) -> Completion {
    if !habit.completed_dates.insert(today) {
        return Completion {
            habit,
            profile,
            outcome: Outcome::AlreadyCompleted,
        };
    }

    refresh_streaks(&mut habit);
    let award = award_xp(&mut profile, XP_PER_COMPLETION);

    Completion {
        habit,
        profile,
        outcome: Outcome::NewlyCompleted(award),
    }
}

/// Clear a habit's completions and current streak. The best streak is kept.
pub fn reset_habit(habit: &mut Habit) {
    habit.completed_dates.clear();
    habit.current_streak = 0;
}
