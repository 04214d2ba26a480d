//! Extract the first email address from `email.txt`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex is valid")
});

pub struct ExtractEmailHandler {
    input: PathBuf,
    output: PathBuf,
}

impl ExtractEmailHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            input: config.path("email.txt"),
            output: config.path("email-sender.txt"),
        }
    }
}

/// The first email-like token in scan order.
pub fn first_email(text: &str) -> Option<&str> {
    EMAIL_RE.find(text).map(|m| m.as_str())
}

#[async_trait]
impl TaskHandler for ExtractEmailHandler {
    fn operation(&self) -> Operation {
        Operation::ExtractEmail
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let text = read_file(&self.input).await?;
        let email = first_email(&text).ok_or_else(|| TaskError::NoMatch {
            what: "email address",
            path: self.input.clone(),
        })?;

        write_file(&self.output, email).await?;

        info!(email, "sender extracted");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("extracted {email}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let text = "From: \"Jane\" <jane.doe+news@example.co.uk>\nTo: bob@example.com\n";
        assert_eq!(first_email(text), Some("jane.doe+news@example.co.uk"));
    }

    #[test]
    fn no_email_is_none() {
        assert_eq!(first_email("nobody here @ all"), None);
        assert_eq!(first_email("user@localhost"), None);
    }

    #[tokio::test]
    async fn writes_sender() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("email.txt"),
            "Subject: hi\nFrom: alice@example.org\n\nbody mentions carol@example.net",
        )
        .unwrap();

        let handler = ExtractEmailHandler::new(&TaskConfig::with_root(dir.path()));
        handler.run("extract sender").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("email-sender.txt")).unwrap();
        assert_eq!(written, "alice@example.org");
    }

    #[tokio::test]
    async fn no_match_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("email.txt"), "no addresses at all").unwrap();

        let handler = ExtractEmailHandler::new(&TaskConfig::with_root(dir.path()));
        let err = handler.run("").await.unwrap_err();

        assert!(matches!(err, TaskError::NoMatch { .. }));
        assert!(!dir.path().join("email-sender.txt").exists());
    }
}
