//! HTTP request surface for DataOps.
//!
//! This crate exposes the task executor over HTTP:
//!
//! - `POST /run?task=...` classifies and runs a task.
//! - `GET /read?path=...` returns a file under the data root.
//! - `GET /api/status` and `GET /api/operations` for discovery.

pub mod api;
pub mod server;
pub mod state;

pub use server::WebServer;
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 3000,
        }
    }
}
