//! Dispatcher -- routes a classified operation to its handler.
//!
//! The registry maps each [`Operation`] to one [`TaskHandler`].  Dispatch
//! resolves the classifier's raw answer with [`Operation::from_key`];
//! anything unrecognized is rejected before any handler runs, so an
//! unsupported answer never touches a file.  Handler runs are serialized per
//! output path through [`PathLocks`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use dataops_agent::LanguageModel;
use dataops_tasks::{Operation, PathLocks, TaskConfig, TaskHandler, TaskOutcome, default_handlers};

use crate::error::{IntentError, Result};

/// Handler registry plus per-path locks.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<Operation, Arc<dyn TaskHandler>>,
    locks: PathLocks,
}

impl Dispatcher {
    /// An empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher with every built-in handler registered.
    pub fn with_default_handlers(config: &TaskConfig, model: Arc<dyn LanguageModel>) -> Self {
        let mut dispatcher = Self::new();
        for handler in default_handlers(config, model) {
            dispatcher.register(handler);
        }
        dispatcher
    }

    /// Register a handler under its own operation, replacing any previous
    /// handler for that operation.
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        let op = handler.operation();
        if self.handlers.insert(op, handler).is_some() {
            warn!(operation = %op, "replacing registered handler");
        }
    }

    /// Registered operations in stable order.
    pub fn operations(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self.handlers.keys().copied().collect();
        ops.sort();
        ops
    }

    /// Resolve the classifier's raw answer and run the matching handler.
    pub async fn dispatch(&self, raw: &str, task: &str) -> Result<TaskOutcome> {
        let op = Operation::from_key(raw).ok_or_else(|| {
            warn!(raw, "classifier answer matches no operation");
            IntentError::UnsupportedOperation {
                raw: raw.trim().to_owned(),
            }
        })?;
        self.dispatch_operation(op, task).await
    }

    /// Run the handler registered for `op`.
    pub async fn dispatch_operation(&self, op: Operation, task: &str) -> Result<TaskOutcome> {
        let handler = self
            .handlers
            .get(&op)
            .ok_or_else(|| IntentError::UnsupportedOperation {
                raw: op.key().to_owned(),
            })?;

        let _guard = self.locks.lock(handler.output_path()).await;
        info!(operation = %op, output = %handler.output_path().display(), "dispatching task");

        let outcome = handler.run(task).await?;
        info!(
            operation = %op,
            skipped = outcome.skipped,
            summary = %outcome.summary,
            "task completed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct CountingHandler {
        op: Operation,
        output: PathBuf,
        runs: AtomicUsize,
    }

    impl CountingHandler {
        fn new(op: Operation) -> Arc<Self> {
            Arc::new(Self {
                op,
                output: PathBuf::from(format!("/data/{}.out", op.key())),
                runs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TaskHandler for CountingHandler {
        fn operation(&self) -> Operation {
            self.op
        }

        fn output_path(&self) -> &Path {
            &self.output
        }

        async fn run(&self, _task: &str) -> dataops_tasks::Result<TaskOutcome> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(TaskOutcome::new(self.op, &self.output, "ran"))
        }
    }

    #[tokio::test]
    async fn dispatches_to_exactly_one_handler() {
        let weekdays = CountingHandler::new(Operation::CountWeekdays);
        let email = CountingHandler::new(Operation::ExtractEmail);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(weekdays.clone());
        dispatcher.register(email.clone());

        let outcome = dispatcher.dispatch("extract_email", "task").await.unwrap();
        assert_eq!(outcome.operation, Operation::ExtractEmail);
        assert_eq!(email.runs.load(Ordering::SeqCst), 1);
        assert_eq!(weekdays.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn task_suffix_alias_dispatches() {
        let email = CountingHandler::new(Operation::ExtractEmail);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(email.clone());

        dispatcher.dispatch("Extract_Email_Task\n", "").await.unwrap();
        assert_eq!(email.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_answer_runs_nothing() {
        let weekdays = CountingHandler::new(Operation::CountWeekdays);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(weekdays.clone());

        let err = dispatcher.dispatch("make_coffee", "").await.unwrap_err();
        assert!(matches!(err, IntentError::UnsupportedOperation { .. }));
        assert_eq!(weekdays.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn known_but_unregistered_operation_is_unsupported() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher.dispatch("ticket_sales", "").await.unwrap_err();
        assert!(matches!(err, IntentError::UnsupportedOperation { .. }));
    }

    #[test]
    fn operations_are_sorted() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(CountingHandler::new(Operation::TicketSales));
        dispatcher.register(CountingHandler::new(Operation::FormatMarkdown));
        assert_eq!(
            dispatcher.operations(),
            [Operation::FormatMarkdown, Operation::TicketSales]
        );
    }
}
