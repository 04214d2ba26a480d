//! Intent error types.
//!
//! All classification and dispatch failures surface through [`IntentError`].
//! [`IntentError::is_client_error`] separates bad requests from system
//! failures for callers that report status codes.

use dataops_tasks::TaskError;

/// Unified error type for classification and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    // -- Request errors ------------------------------------------------------
    /// The task description was empty after trimming.
    #[error("task description is empty")]
    EmptyTask,

    /// The classifier answered with something that is not a known operation.
    #[error("unsupported operation: `{raw}`")]
    UnsupportedOperation { raw: String },

    // -- System errors -------------------------------------------------------
    /// The language model could not classify the task.
    #[error("classification failed: {reason}")]
    ClassificationFailed { reason: String },

    /// The selected handler failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl IntentError {
    /// Whether the request (not the system) is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::EmptyTask | Self::UnsupportedOperation { .. } => true,
            Self::ClassificationFailed { .. } => false,
            Self::Task(e) => e.is_client_error(),
        }
    }
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
