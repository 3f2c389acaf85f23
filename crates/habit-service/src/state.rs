//! Application state.

use std::sync::Arc;

use habit_store::{Store, Tracker};

use crate::auth::JwksVerifier;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs habit and profile operations against the store.
    pub tracker: Arc<Tracker>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Bearer token verifier with its key cache.
    pub jwks: Arc<JwksVerifier>,
}

impl AppState {
    /// Create a new application state over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self {
            tracker: Arc::new(Tracker::new(store)),
            config,
            jwks: Arc::new(JwksVerifier::new()),
        }
    }
}
