//! Profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use habit_core::{ProfileUpdate, ProfileView};

use super::with_tracker;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Get the user's profile, creating the default one on first access.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ProfileView>, ApiError> {
    let profile =
        with_tracker(&state, move |tracker| Ok(tracker.get_or_create_profile(&auth.user_id)?))
            .await?;
    Ok(Json(profile.to_view()))
}

/// Edit the profile's name or avatar.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = with_tracker(&state, move |tracker| {
        Ok(tracker.update_profile(&auth.user_id, &update)?)
    })
    .await?;
    Ok(Json(profile.to_view()))
}

/// Delete every habit and the profile.
pub async fn reset_all(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    with_tracker(&state, move |tracker| Ok(tracker.reset_all(&auth.user_id)?)).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
