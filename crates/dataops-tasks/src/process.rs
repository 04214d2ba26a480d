//! Bounded subprocess execution.
//!
//! Wraps `tokio::process::Command` with a timeout.  The child is spawned
//! with `kill_on_drop(true)`, so a timed-out process is killed when its
//! future is dropped.  Captured output is truncated to [`MAX_OUTPUT_BYTES`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, TaskError};

/// Maximum captured size for each of stdout and stderr (100 KB).
const MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, failing if it cannot be spawned, exceeds
/// `timeout`, or exits non-zero.
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput> {
    debug!(
        program,
        args = ?args,
        timeout_secs = timeout.as_secs(),
        "running command"
    );

    let mut command = tokio::process::Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| TaskError::Spawn {
        program: program.to_owned(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(TaskError::Spawn {
                program: program.to_owned(),
                source,
            });
        }
        Err(_) => {
            warn!(program, timeout_secs = timeout.as_secs(), "command timed out");
            return Err(TaskError::Timeout {
                seconds: timeout.as_secs(),
                reason: format!("`{program}` exceeded its time limit"),
            });
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = truncate_output(&output.stdout);
    let stderr = truncate_output(&output.stderr);

    if exit_code != 0 {
        return Err(TaskError::Subprocess {
            program: program.to_owned(),
            exit_code,
            stderr: stderr.trim().to_owned(),
        });
    }

    debug!(program, exit_code, "command completed");
    Ok(CommandOutput {
        exit_code,
        stdout,
        stderr,
    })
}

fn truncate_output(raw: &[u8]) -> String {
    if raw.len() <= MAX_OUTPUT_BYTES {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        let mut s = String::from_utf8_lossy(&raw[..MAX_OUTPUT_BYTES]).into_owned();
        s.push_str("\n... [output truncated at 100 KB]");
        s
    }
}
