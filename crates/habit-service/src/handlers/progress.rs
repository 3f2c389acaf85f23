//! Progress and badge overview handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use habit_core::badge::{catalog, next_milestone};
use habit_core::{Badge, BadgeProgress, ProgressSummary};

use super::{server_today, with_tracker};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Progress query parameters.
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Day the summary is computed for. Defaults to the server's UTC date.
    pub date: Option<NaiveDate>,
}

/// The next badge to earn.
#[derive(Debug, Serialize)]
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
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgesResponse {
    /// Lifetime XP.
    pub total_xp: u64,
    /// Every badge with its progress.
    pub badges: Vec<BadgeProgress>,
    /// The lowest badge not yet held.
    pub next: Option<NextBadge>,
}

/// Summarize completion statistics.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let today = query.date.unwrap_or_else(server_today);
    let summary =
        with_tracker(&state, move |tracker| Ok(tracker.progress(&auth.user_id, today)?)).await?;
    Ok(Json(summary))
}

/// List badges with progress towards each.
pub async fn get_badges(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BadgesResponse>, ApiError> {
    let profile =
        with_tracker(&state, move |tracker| Ok(tracker.get_or_create_profile(&auth.user_id)?))
            .await?;

    let next = next_milestone(&profile.badges).map(|m| NextBadge {
        badge: m.badge,
        xp_required: m.threshold,
        xp_remaining: m.threshold.saturating_sub(profile.total_xp),
    });

    Ok(Json(BadgesResponse {
        total_xp: profile.total_xp,
        badges: catalog(profile.total_xp, &profile.badges),
        next,
    }))
}
