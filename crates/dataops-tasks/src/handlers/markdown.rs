//! Format `format.md` in place with the configured formatter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{FormatterConfig, TaskConfig};
use crate::error::{Result, TaskError};
use crate::operation::Operation;
use crate::process::run_command;
use crate::traits::{TaskHandler, TaskOutcome};

pub struct FormatMarkdownHandler {
    path: PathBuf,
    formatter: FormatterConfig,
}

impl FormatMarkdownHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            path: config.path("format.md"),
            formatter: config.formatter.clone(),
        }
    }
}

#[async_trait]
impl TaskHandler for FormatMarkdownHandler {
    fn operation(&self) -> Operation {
        Operation::FormatMarkdown
    }

    fn output_path(&self) -> &Path {
        &self.path
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        // Surface a missing input as a read error rather than a formatter failure.
        tokio::fs::metadata(&self.path)
            .await
            .map_err(|source| TaskError::Read {
                path: self.path.clone(),
                source,
            })?;

        let mut args = self.formatter.args.clone();
        args.push(self.path.to_string_lossy().into_owned());

        run_command(
            &self.formatter.program,
            &args,
            self.path.parent(),
            Duration::from_secs(self.formatter.timeout_secs),
        )
        .await?;

        info!(path = %self.path.display(), "markdown formatted");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.path,
            format!("formatted {} in place", self.path.display()),
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn handler(root: &Path, script: &str) -> FormatMarkdownHandler {
        let mut config = TaskConfig::with_root(root);
        // `sh -c SCRIPT FILE` binds the appended file path to `$0`.
        config.formatter = FormatterConfig {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            timeout_secs: 5,
        };
        FormatMarkdownHandler::new(&config)
    }

    #[tokio::test]
    async fn formatter_rewrites_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("format.md");
        std::fs::write(&path, "#  title\n").unwrap();

        let h = handler(dir.path(), r#"printf '# title\n' > "$0""#);
        let outcome = h.run("format the markdown").await.unwrap();

        assert_eq!(outcome.operation, Operation::FormatMarkdown);
        assert_eq!(outcome.output_path, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# title\n");
    }

    #[tokio::test]
    async fn missing_input_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), "true");
        let err = h.run("").await.unwrap_err();
        assert!(matches!(err, TaskError::Read { .. }));
    }

    #[tokio::test]
    async fn formatter_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("format.md"), "x").unwrap();
        let h = handler(dir.path(), "echo 'syntax error' >&2; exit 2");
        let err = h.run("").await.unwrap_err();
        assert!(matches!(err, TaskError::Subprocess { exit_code: 2, .. }));
    }
}
