//! Habit tracker HTTP API service.
//!
//! This crate exposes the [`habit_store::Tracker`] over HTTP:
//!
//! - Habit management and daily completion
//! - Profile, levels and badges
//! - Progress statistics
//! - Backup export/import
//!
//! # Authentication
//!
//! All `/v1` routes require `Authorization: Bearer <jwt>`. Tokens are
//! verified against the identity provider's JWKS; the `sub` claim is the
//! user ID.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers must be async

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
