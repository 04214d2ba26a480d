//! Task classification and dispatch for DataOps.
//!
//! This crate provides:
//!
//! - **Classification**: the language model names the operation a free-text
//!   task describes, via [`classifier::IntentClassifier`].
//! - **Dispatch**: the model's answer is validated against the closed
//!   operation set and routed to exactly one handler, via
//!   [`dispatcher::Dispatcher`].
//! - **Execution**: [`executor::TaskExecutor`] chains the two.

pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod executor;

pub use classifier::IntentClassifier;
pub use dispatcher::Dispatcher;
pub use error::{IntentError, Result};
pub use executor::TaskExecutor;
