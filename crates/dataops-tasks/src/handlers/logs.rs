//! First lines of the most recently modified `*.log` files.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

/// How many log files are consulted.
pub const RECENT_LOG_LIMIT: usize = 10;

pub struct LogsRecentHandler {
    logs_dir: PathBuf,
    output: PathBuf,
    limit: usize,
}

impl LogsRecentHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            logs_dir: config.path("logs"),
            output: config.path("logs-recent.txt"),
            limit: RECENT_LOG_LIMIT,
        }
    }

    /// `*.log` files in the logs directory, newest first.  Equal mtimes are
    /// ordered by file name.
    async fn recent_logs(&self) -> Result<Vec<PathBuf>> {
        let read_err = |source| TaskError::Read {
            path: self.logs_dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.logs_dir).await.map_err(read_err)?;
        let mut logs: Vec<(SystemTime, String, PathBuf)> = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "log") {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping log without metadata");
                    continue;
                }
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let name = entry.file_name().to_string_lossy().into_owned();
            logs.push((modified, name, path));
        }

        logs.sort_by(|a, b| (Reverse(a.0), &a.1).cmp(&(Reverse(b.0), &b.1)));
        Ok(logs
            .into_iter()
            .take(self.limit)
            .map(|(_, _, path)| path)
            .collect())
    }
}

#[async_trait]
impl TaskHandler for LogsRecentHandler {
    fn operation(&self) -> Operation {
        Operation::LogsRecent
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let logs = self.recent_logs().await?;

        let mut lines = Vec::with_capacity(logs.len());
        let mut skipped = 0;
        for path in &logs {
            match read_file(path).await {
                Ok(text) => match text.lines().next() {
                    Some(first) => lines.push(first.to_owned()),
                    None => {
                        debug!(path = %path.display(), "skipping empty log");
                        skipped += 1;
                    }
                },
                Err(e) => {
                    debug!(error = %e, "skipping unreadable log");
                    skipped += 1;
                }
            }
        }

        write_file(&self.output, &lines.join("\n")).await?;

        info!(files = logs.len(), lines = lines.len(), skipped, "recent logs summarized");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("wrote first lines of {} recent log files", lines.len()),
        )
        .with_skipped(skipped))
    }
}
