//! Sort `contacts.json` by last name, then first name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

pub struct SortContactsHandler {
    input: PathBuf,
    output: PathBuf,
}

impl SortContactsHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            input: config.path("contacts.json"),
            output: config.path("contacts-sorted.json"),
        }
    }
}

/// Stable sort by `(last_name, first_name)`, compared case-insensitively.
/// Missing or non-string fields sort as the empty string.
pub fn sort_contacts(contacts: &mut [Value]) {
    contacts.sort_by_cached_key(|c| (field(c, "last_name"), field(c, "first_name")));
}

fn field(contact: &Value, name: &str) -> String {
    contact
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

#[async_trait]
impl TaskHandler for SortContactsHandler {
    fn operation(&self) -> Operation {
        Operation::SortContacts
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let text = read_file(&self.input).await?;
        let mut contacts = match serde_json::from_str::<Value>(&text)? {
            Value::Array(items) => items,
            other => {
                return Err(TaskError::InvalidInput {
                    path: self.input.clone(),
                    reason: format!("expected a JSON array, found {}", json_kind(&other)),
                });
            }
        };

        sort_contacts(&mut contacts);
        let rendered = serde_json::to_string_pretty(&contacts)?;
        write_file(&self.output, &rendered).await?;

        info!(count = contacts.len(), "contacts sorted");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("sorted {} contacts", contacts.len()),
        ))
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
