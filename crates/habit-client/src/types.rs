//! Request and response types for the habit tracker client.
//!
//! Habit and profile payloads use the shared interchange shapes from
//! `habit_core` ([`HabitView`], [`ProfileView`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use habit_core::{Badge, HabitView, ProfileView};

/// Create habit request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateHabitRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Complete habit request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompleteHabitRequest {
    /// Day to record; the server uses its UTC date when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Result of completing a habit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    /// The habit after the call.
    pub habit: HabitView,
    /// The profile after the call.
    pub profile: ProfileView,
    /// XP applied (0 when already completed).
    pub xp_gained: u32,
    /// Whether the day had already been recorded.
    pub already_completed: bool,
    /// Badges unlocked by this completion.
    #[serde(default)]
    pub new_badges: Vec<Badge>,
    /// Levels gained by this completion.
    #[serde(default)]
    pub levels_gained: u32,
}

/// One badge in the badge overview.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    /// Badge identifier.
    pub id: Badge,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Lifetime XP required.
    pub xp_required: u64,
    /// Whether the badge is held.
    pub earned: bool,
    /// Fraction of the threshold reached, capped at 1.0.
    pub progress: f64,
    /// XP still missing.
    pub xp_remaining: u64,
}

/// The next badge to earn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBadge {
    /// Badge identifier.
    pub badge: Badge,
    /// Lifetime XP required.
    pub xp_required: u64,
    /// XP still missing.
    pub xp_remaining: u64,
}

/// Badge overview response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgesResponse {
    /// Lifetime XP.
    pub total_xp: u64,
    /// Every badge with its progress.
    pub badges: Vec<BadgeStatus>,
    /// The lowest badge not yet held.
    pub next: Option<NextBadge>,
}

/// State after an import.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportResponse {
    /// Imported habits.
    pub habits: Vec<HabitView>,
    /// Imported profile.
    pub profile: ProfileView,
}

/// API error response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// API error details.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
