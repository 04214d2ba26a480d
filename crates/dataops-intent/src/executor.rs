//! Task executor -- classify, then dispatch.

use std::sync::Arc;

use tracing::debug;

use dataops_agent::LanguageModel;
use dataops_tasks::{Operation, TaskConfig, TaskOutcome};

use crate::classifier::IntentClassifier;
use crate::dispatcher::Dispatcher;
use crate::error::{IntentError, Result};

/// Runs a free-text task end to end.
pub struct TaskExecutor {
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
}

impl TaskExecutor {
    pub fn new(classifier: IntentClassifier, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }

    /// An executor with the built-in handlers, sharing one model between the
    /// classifier and the model-backed handlers.
    pub fn with_default_handlers(config: &TaskConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self::new(
            IntentClassifier::new(Arc::clone(&model)),
            Dispatcher::with_default_handlers(config, model),
        )
    }

    /// Classify `task` and run the selected handler.
    pub async fn execute(&self, task: &str) -> Result<TaskOutcome> {
        let task = task.trim();
        if task.is_empty() {
            return Err(IntentError::EmptyTask);
        }
        let raw = self.classifier.classify(task).await?;
        debug!(raw = %raw, "dispatching classified task");
        self.dispatcher.dispatch(&raw, task).await
    }

    /// Operations this executor can run.
    pub fn operations(&self) -> Vec<Operation> {
        self.dispatcher.operations()
    }
}
