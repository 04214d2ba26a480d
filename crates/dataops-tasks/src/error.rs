//! Task error types.
//!
//! Every handler surfaces failures through [`TaskError`].  I/O variants keep
//! the offending path and the original `std::io::Error` as their source so
//! the full cause chain is available to callers and logs.

use std::path::PathBuf;

use dataops_agent::AgentError;
use dataops_store::StoreError;

/// Unified error type for task handlers.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The handler's input could not be opened or read.
    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handler's output could not be written.
    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input was readable but its content is not what the handler needs.
    #[error("invalid input in `{}`: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// A required pattern was not found in the input.
    #[error("no {what} found in `{}`", .path.display())]
    NoMatch { what: &'static str, path: PathBuf },

    /// A path was requested outside the data root.
    #[error("path `{path}` is outside the data root `{root}`")]
    PathOutsideRoot { path: String, root: String },

    /// An external program could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully.
    #[error("`{program}` exited with code {exit_code}: {stderr}")]
    Subprocess {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    /// An operation exceeded its time limit.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// The language model call failed.
    #[error("model error: {0}")]
    Model(#[from] AgentError),

    /// The ticket database query failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the tasks crate.
pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    /// Whether the caller (not the system) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::PathOutsideRoot { .. })
    }
}
