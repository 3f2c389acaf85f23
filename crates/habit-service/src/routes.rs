//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{backup, habits, health, profile, progress};
use crate::state::AppState;

/// Maximum concurrent in-flight requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Habits (JWT auth)
/// - `GET /v1/habits` - List habits
/// - `POST /v1/habits` - Create a habit
/// - `DELETE /v1/habits/:id` - Delete a habit
/// - `PATCH /v1/habits/:id` - Complete a habit for a day
/// - `POST /v1/habits/:id/reset` - Reset a habit's history
///
/// ## Profile (JWT auth)
/// - `GET /v1/profile` - Get (or create) the profile
/// - `PATCH /v1/profile` - Edit name or avatar
/// - `DELETE /v1/profile` - Delete all habits and the profile
///
/// ## Progress and backups (JWT auth)
/// - `GET /v1/progress?date=` - Progress summary
/// - `GET /v1/badges` - Badge overview
/// - `GET /v1/export` - Export a backup
/// - `POST /v1/import` - Import a backup
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Habits
        .route("/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/habits/:id", delete(habits::delete_habit).patch(habits::complete_habit))
        .route("/habits/:id/reset", post(habits::reset_habit))
        // Profile
        .route(
            "/profile",
            get(profile::get_profile)
                .patch(profile::update_profile)
                .delete(profile::reset_all),
        )
        // Progress
        .route("/progress", get(progress::get_progress))
        .route("/badges", get(progress::get_badges))
        // Backups
        .route("/export", get(backup::export_backup))
        .route("/import", post(backup::import_backup))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}
