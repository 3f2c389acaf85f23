//! Badge catalog.
//!
//! Badges are permanent achievements unlocked when lifetime XP crosses a
//! fixed threshold. The milestone table is ordered by threshold.

use serde::{Deserialize, Serialize};

/// An achievement badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// 100 lifetime XP.
    Bronze,
    /// 300 lifetime XP.
    Silver,
    /// 600 lifetime XP.
    Gold,
    /// 1000 lifetime XP.
    Diamond,
}

/// A (lifetime XP threshold, badge) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    /// Lifetime XP required.
    pub threshold: u64,
    /// Badge awarded once the threshold is reached.
    pub badge: Badge,
}

/// Milestones in ascending threshold order.
pub const MILESTONES: [Milestone; 4] = [
    Milestone {
        threshold: 100,
        badge: Badge::Bronze,
    },
    Milestone {
        threshold: 300,
        badge: Badge::Silver,
    },
    Milestone {
        threshold: 600,
        badge: Badge::Gold,
    },
    Milestone {
        threshold: 1000,
        badge: Badge::Diamond,
    },
];

impl Badge {
    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze Explorer",
            Self::Silver => "Silver Achiever",
            Self::Gold => "Gold Champion",
            Self::Diamond => "Diamond Master",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Bronze => "Earned your first 100 XP points",
            Self::Silver => "Reached 300 XP with consistent progress",
            Self::Gold => "Accumulated 600 XP through dedication",
            Self::Diamond => "Reached the pinnacle with 1000+ XP",
        }
    }
}

/// Badges whose threshold `total_xp` has reached, in milestone order.
#[must_use]
pub fn earned_at(total_xp: u64) -> Vec<Badge> {
    MILESTONES
        .iter()
        .filter(|m| total_xp >= m.threshold)
        .map(|m| m.badge)
        .collect()
}

/// Progress towards one badge, for the badge overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    /// Badge identifier.
    pub id: Badge,
    /// Display name.
    pub name: &'static str,
    /// Description.
    pub description: &'static str,
    /// Lifetime XP required.
    pub xp_required: u64,
    /// Whether the profile already holds the badge.
    pub earned: bool,
    /// Fraction of the threshold reached, capped at 1.0.
    pub progress: f64,
    /// XP still missing (0 once reached).
    pub xp_remaining: u64,
}

/// Build the badge overview for a profile's lifetime XP and held badges.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn catalog(total_xp: u64, held: &[Badge]) -> Vec<BadgeProgress> {
    MILESTONES
        .iter()
        .map(|m| BadgeProgress {
            id: m.badge,
            name: m.badge.display_name(),
            description: m.badge.description(),
            xp_required: m.threshold,
            earned: held.contains(&m.badge),
            progress: (total_xp as f64 / m.threshold as f64).min(1.0),
            xp_remaining: m.threshold.saturating_sub(total_xp),
        })
        .collect()
}

/// The lowest milestone not yet held, if any.
#[must_use]
pub fn next_milestone(held: &[Badge]) -> Option<Milestone> {
    MILESTONES.iter().copied().find(|m| !held.contains(&m.badge))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_ascend() {
        assert!(MILESTONES.windows(2).all(|w| w[0].threshold < w[1].threshold));
    }

    #[test]
    fn badge_serializes_as_lowercase_id() {
        assert_eq!(serde_json::to_string(&Badge::Diamond).unwrap(), "\"diamond\"");
        let b: Badge = serde_json::from_str("\"silver\"").unwrap();
        assert_eq!(b, Badge::Silver);
        assert!(serde_json::from_str::<Badge>("\"platinum\"").is_err());
    }

    #[test]
    fn earned_at_thresholds() {
        assert!(earned_at(99).is_empty());
        assert_eq!(earned_at(150), vec![Badge::Bronze]);
        assert_eq!(
            earned_at(1000),
            vec![Badge::Bronze, Badge::Silver, Badge::Gold, Badge::Diamond]
        );
    }

    #[test]
    fn catalog_reports_progress() {
        let entries = catalog(150, &[Badge::Bronze]);
        assert_eq!(entries.len(), 4);
        assert!(entries[0].earned);
        assert!((entries[0].progress - 1.0).abs() < f64::EPSILON);
        assert!(!entries[1].earned);
        assert!((entries[1].progress - 0.5).abs() < f64::EPSILON);
        assert_eq!(entries[1].xp_remaining, 150);
    }

    #[test]
    fn next_milestone_skips_held() {
        assert_eq!(next_milestone(&[]).map(|m| m.badge), Some(Badge::Bronze));
        assert_eq!(
            next_milestone(&[Badge::Bronze, Badge::Silver]).map(|m| m.threshold),
            Some(600)
        );
        assert!(next_milestone(&[
            Badge::Bronze,
            Badge::Silver,
            Badge::Gold,
            Badge::Diamond
        ])
        .is_none());
    }
}
