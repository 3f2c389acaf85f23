//! Habit handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use habit_core::{Badge, Completion, Habit, HabitView, ProfileView};

use super::{parse_habit_id, server_today, with_tracker};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Create habit request.
#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    /// Display name (required, trimmed).
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Complete habit request.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteHabitRequest {
    /// Day to record. Defaults to the server's current UTC date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Result of completing a habit.
#[derive(Debug, Serialize)]
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
    pub new_badges: Vec<Badge>,
    /// Levels gained by this completion.
    pub levels_gained: u32,
}

impl From<&Completion> for CompletionResponse {
    fn from(completion: &Completion) -> Self {
        let award = completion.award();
        Self {
            habit: completion.habit.to_view(),
            profile: completion.profile.to_view(),
            xp_gained: completion.xp_gained(),
            already_completed: completion.is_already_completed(),
            new_badges: award.map(|a| a.new_badges.clone()).unwrap_or_default(),
            levels_gained: award.map_or(0, |a| a.levels_gained),
        }
    }
}

/// List the user's habits in creation order.
pub async fn list_habits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<HabitView>>, ApiError> {
    let habits =
        with_tracker(&state, move |tracker| Ok(tracker.list_habits(&auth.user_id)?)).await?;
    Ok(Json(habits.iter().map(Habit::to_view).collect()))
}

/// Create a habit.
pub async fn create_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<HabitView>), ApiError> {
    let habit = with_tracker(&state, move |tracker| {
        Ok(tracker.create_habit(&auth.user_id, &body.name, body.description.as_deref())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(habit.to_view())))
}

/// Delete a habit.
pub async fn delete_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    with_tracker(&state, move |tracker| {
        Ok(tracker.delete_habit(&auth.user_id, &habit_id)?)
    })
    .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Mark a habit completed on a day.
pub async fn complete_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
    Json(body): Json<CompleteHabitRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let today = body.date.unwrap_or_else(server_today);

    let completion = with_tracker(&state, move |tracker| {
        Ok(tracker.complete_habit(&auth.user_id, &habit_id, today)?)
    })
    .await?;

    Ok(Json(CompletionResponse::from(&completion)))
}

/// Clear a habit's completions and current streak.
pub async fn reset_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
) -> Result<Json<HabitView>, ApiError> {
    let habit_id = parse_habit_id(&habit_id)?;
    let habit =
        with_tracker(&state, move |tracker| Ok(tracker.reset_habit(&auth.user_id, &habit_id)?))
            .await?;

    Ok(Json(habit.to_view()))
}
