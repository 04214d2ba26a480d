//! Index the first heading of every markdown file under `docs/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

pub struct IndexDocsHandler {
    docs_dir: PathBuf,
    output: PathBuf,
}

impl IndexDocsHandler {
    pub fn new(config: &TaskConfig) -> Self {
        let docs_dir = config.path("docs");
        Self {
            output: docs_dir.join("index.json"),
            docs_dir,
        }
    }

    /// Every `*.md` file below the docs directory, in no particular order,
    /// plus the number of subdirectories and entries that could not be read.
    ///
    /// Only failing to open `docs/` itself is an error.
    async fn markdown_files(&self) -> Result<(Vec<PathBuf>, usize)> {
        let mut found = Vec::new();
        let mut skipped = 0;
        let mut entries = tokio::fs::read_dir(&self.docs_dir)
            .await
            .map_err(|source| TaskError::Read {
                path: self.docs_dir.clone(),
                source,
            })?;
        let mut pending = Vec::new();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => Some(entry),
                Ok(None) => None,
                Err(e) => {
                    debug!(error = %e, "abandoning directory after a failed read");
                    skipped += 1;
                    None
                }
            };

            let Some(entry) = entry else {
                // Current directory exhausted; move on to the next readable one.
                let Some(next) = next_readable_dir(&mut pending, &mut skipped).await else {
                    break;
                };
                entries = next;
                continue;
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(ft) if ft.is_file() && path.extension().is_some_and(|ext| ext == "md") => {
                    found.push(path);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping entry of unknown type");
                    skipped += 1;
                }
            }
        }
        Ok((found, skipped))
    }
}

/// Pop directories off `pending` until one opens, counting the failures.
async fn next_readable_dir(
    pending: &mut Vec<PathBuf>,
    skipped: &mut usize,
) -> Option<tokio::fs::ReadDir> {
    while let Some(dir) = pending.pop() {
        match tokio::fs::read_dir(&dir).await {
            Ok(entries) => return Some(entries),
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
                *skipped += 1;
            }
        }
    }
    None
}

/// The first line starting with `#`, with leading `#`s and surrounding
/// whitespace removed.
pub fn first_heading(text: &str) -> Option<&str> {
    text.lines()
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim())
}

/// `docs/a/b.md` -> `a/b.md`, always `/`-separated.
fn index_key(docs_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(docs_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl TaskHandler for IndexDocsHandler {
    fn operation(&self) -> Operation {
        Operation::IndexDocs
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let (files, mut skipped) = self.markdown_files().await?;

        let mut index = BTreeMap::new();
        for path in &files {
            let text = match read_file(path).await {
                Ok(text) => text,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable document");
                    skipped += 1;
                    continue;
                }
            };
            match first_heading(&text) {
                Some(title) => {
                    index.insert(index_key(&self.docs_dir, path), title.to_owned());
                }
                None => {
                    debug!(path = %path.display(), "skipping document without heading");
                    skipped += 1;
                }
            }
        }

        let rendered = serde_json::to_string_pretty(&index)?;
        write_file(&self.output, &rendered).await?;

        info!(indexed = index.len(), skipped, "docs indexed");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("indexed {} documents", index.len()),
        )
        .with_skipped(skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_heading_takes_the_first_hash_line() {
        let text = "intro\n## Second level\n# Top\n";
        assert_eq!(first_heading(text), Some("Second level"));
    }

    #[test]
    fn first_heading_requires_hash_at_line_start() {
        assert_eq!(first_heading("  # indented\nplain"), None);
        assert_eq!(first_heading(""), None);
    }

    #[test]
    fn first_heading_strips_hashes_and_spaces() {
        assert_eq!(first_heading("###   Spaced out   \n"), Some("Spaced out"));
    }

    #[tokio::test]
    async fn indexes_recursively_and_skips_headingless_files() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("guide/deep")).unwrap();
        std::fs::write(docs.join("README.md"), "# Readme\n# Second\n").unwrap();
        std::fs::write(docs.join("guide/install.md"), "text\n# Install\n").unwrap();
        std::fs::write(docs.join("guide/deep/notes.md"), "no heading here\n").unwrap();
        std::fs::write(docs.join("guide/other.txt"), "# Not markdown\n").unwrap();

        let handler = IndexDocsHandler::new(&TaskConfig::with_root(dir.path()));
        let outcome = handler.run("index docs").await.unwrap();

        let written = std::fs::read_to_string(docs.join("index.json")).unwrap();
        let index: BTreeMap<String, String> = serde_json::from_str(&written).unwrap();
        let expected = BTreeMap::from([
            ("README.md".to_owned(), "Readme".to_owned()),
            ("guide/install.md".to_owned(), "Install".to_owned()),
        ]);
        assert_eq!(index, expected);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn unreadable_subdirectories_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let readable = dir.path().join("guide");
        std::fs::create_dir(&readable).unwrap();

        // A directory that vanished between listing and reading, then a good one.
        let mut pending = vec![readable.clone(), dir.path().join("gone")];
        let mut skipped = 0;
        assert!(next_readable_dir(&mut pending, &mut skipped).await.is_some());
        assert_eq!(skipped, 1);
        assert!(pending.is_empty());

        assert!(next_readable_dir(&mut pending, &mut skipped).await.is_none());
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn missing_docs_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = IndexDocsHandler::new(&TaskConfig::with_root(dir.path()));
        let err = handler.run("").await.unwrap_err();
        assert!(matches!(err, TaskError::Read { .. }));
    }

    #[tokio::test]
    async fn empty_docs_dir_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();

        let handler = IndexDocsHandler::new(&TaskConfig::with_root(dir.path()));
        handler.run("").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("docs/index.json")).unwrap();
        assert_eq!(written, "{}");
    }
}
