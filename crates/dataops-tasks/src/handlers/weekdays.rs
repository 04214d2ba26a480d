//! Count the Wednesdays listed in `dates.txt`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::error::Result;
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CountWeekdaysHandler {
    input: PathBuf,
    output: PathBuf,
    weekday: Weekday,
}

impl CountWeekdaysHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            input: config.path("dates.txt"),
            output: config.path("dates-wednesdays.txt"),
            weekday: Weekday::Wed,
        }
    }
}

/// Count lines that parse as `YYYY-MM-DD` and fall on `weekday`.
///
/// Returns `(count, skipped)` where `skipped` is the number of non-blank
/// lines that did not parse.  Blank lines are ignored.
pub fn count_weekday(text: &str, weekday: Weekday) -> (usize, usize) {
    let mut count = 0;
    let mut skipped = 0;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match NaiveDate::parse_from_str(line, DATE_FORMAT) {
            Ok(date) if date.weekday() == weekday => count += 1,
            Ok(_) => {}
            Err(e) => {
                debug!(line, error = %e, "skipping unparsable date");
                skipped += 1;
            }
        }
    }
    (count, skipped)
}

#[async_trait]
impl TaskHandler for CountWeekdaysHandler {
    fn operation(&self) -> Operation {
        Operation::CountWeekdays
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let text = read_file(&self.input).await?;
        let (count, skipped) = count_weekday(&text, self.weekday);
        write_file(&self.output, &count.to_string()).await?;

        info!(count, skipped, weekday = %self.weekday, "weekdays counted");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("{count} dates fall on {}", self.weekday),
        )
        .with_skipped(skipped))
    }
}
