//! Core handler trait and supporting types.
//!
//! Every task handler implements [`TaskHandler`], giving the dispatcher a
//! uniform way to discover which operation a handler serves, which file it
//! writes (for per-path locking) and how to run it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::operation::Operation;

/// The result of a successful handler run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    /// Which operation produced this outcome.
    pub operation: Operation,
    /// The file that was written.
    pub output_path: PathBuf,
    /// A short human-readable description of what was written.
    pub summary: String,
    /// Items the handler skipped as soft failures (unparsable lines,
    /// unreadable files, documents without a heading).
    pub skipped: usize,
}

impl TaskOutcome {
    pub fn new(operation: Operation, output_path: impl Into<PathBuf>, summary: impl Into<String>) -> Self {
        Self {
            operation,
            output_path: output_path.into(),
            summary: summary.into(),
            skipped: 0,
        }
    }

    /// Record the number of soft-failed items.
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }
}

/// A fixed-path file transformation.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The operation this handler serves.
    fn operation(&self) -> Operation;

    /// The file this handler writes.  Concurrent runs are serialized on it.
    fn output_path(&self) -> &Path;

    /// Run the transformation.
    ///
    /// `task` is the original description; handlers read fixed paths and do
    /// not take parameters from it.
    async fn run(&self, task: &str) -> Result<TaskOutcome>;
}
