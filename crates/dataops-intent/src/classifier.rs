//! Intent classifier -- asks the language model which operation a task
//! describes.
//!
//! The model sees the full list of operation keys, each with one example
//! task, and is told to answer with the key alone.  [`IntentClassifier::classify`]
//! returns the raw answer; [`IntentClassifier::classify_operation`] also
//! validates it against the closed [`Operation`] set.

use std::sync::Arc;

use tracing::{debug, info, warn};

use dataops_agent::{ChatRequest, LanguageModel, Message};
use dataops_tasks::Operation;

use crate::error::{IntentError, Result};

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

const PROMPT_HEADER: &str = "\
You are a task classifier for a data-processing service. Given a task \
description, decide which ONE of the operations below it asks for.

Respond with ONLY the operation name exactly as listed. No explanation, no \
punctuation, no code formatting.

Operations:";

/// Token budget for the answer; a key is a handful of tokens.
const MAX_ANSWER_TOKENS: u32 = 20;

/// Build the system prompt listing every operation with its example.
pub fn system_prompt() -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    for op in Operation::ALL {
        prompt.push_str(&format!("\n- {}: e.g. \"{}\"", op.key(), op.example()));
    }
    prompt
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies free-text tasks with a language model.
pub struct IntentClassifier {
    model: Arc<dyn LanguageModel>,
    system_prompt: String,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            system_prompt: system_prompt(),
        }
    }

    /// Ask the model for the operation name.  Returns the trimmed answer
    /// without validating it.
    pub async fn classify(&self, task: &str) -> Result<String> {
        let task = task.trim();
        if task.is_empty() {
            return Err(IntentError::EmptyTask);
        }

        debug!(task, "classifying task");

        let request = ChatRequest {
            model: String::new(),
            messages: vec![
                Message::system(self.system_prompt.clone()),
                Message::user(task),
            ],
            temperature: Some(0.0),
            max_tokens: Some(MAX_ANSWER_TOKENS),
        };

        let response = self.model.complete(&request).await.map_err(|e| {
            warn!(error = %e, "classification request failed");
            IntentError::ClassificationFailed {
                reason: format!("LLM call failed: {e}"),
            }
        })?;

        let answer = response.text.trim().to_owned();
        info!(answer = %answer, "task classified");
        Ok(answer)
    }

    /// Classify and resolve to an [`Operation`], rejecting anything that is
    /// not a known key.
    pub async fn classify_operation(&self, task: &str) -> Result<Operation> {
        let raw = self.classify(task).await?;
        Operation::from_key(&raw).ok_or(IntentError::UnsupportedOperation { raw })
    }
}
