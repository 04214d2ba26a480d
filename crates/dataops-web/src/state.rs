//! Shared application state for the web server.
//!
//! [`AppState`] is wrapped in an `Arc` and shared across all request
//! handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dataops_intent::TaskExecutor;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Classifies and runs tasks.
    pub executor: Arc<TaskExecutor>,

    /// Root directory `/read` is confined to.
    pub data_root: PathBuf,

    /// When the state was built, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(executor: Arc<TaskExecutor>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            data_root: data_root.into(),
            started_at: Instant::now(),
        }
    }
}
