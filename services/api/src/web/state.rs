//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use submission_core::ports::{MatchPolicy, ProjectStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProjectStore>,
    /// Decides when a completed submission updates an existing record.
    pub match_policy: Arc<dyn MatchPolicy>,
    pub config: Arc<Config>,
}
