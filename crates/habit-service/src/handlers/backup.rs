//! Backup export/import handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use habit_core::{Backup, Habit, HabitView, ProfileView};

use super::with_tracker;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// State after an import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Imported habits.
    pub habits: Vec<HabitView>,
    /// Imported profile.
    pub profile: ProfileView,
}

/// Export the user's habits and profile.
pub async fn export_backup(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Backup>, ApiError> {
    let backup =
        with_tracker(&state, move |tracker| Ok(tracker.export(&auth.user_id, Utc::now())?))
            .await?;
    Ok(Json(backup))
}

/// Replace the user's habits and profile with a backup.
pub async fn import_backup(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(backup): Json<Backup>,
) -> Result<Json<ImportResponse>, ApiError> {
    let restored =
        with_tracker(&state, move |tracker| Ok(tracker.import(&auth.user_id, backup)?)).await?;

    Ok(Json(ImportResponse {
        habits: restored.habits.iter().map(Habit::to_view).collect(),
        profile: restored.profile.to_view(),
    }))
}
