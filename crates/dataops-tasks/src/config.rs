//! Handler configuration.
//!
//! Handler paths are fixed relative to [`TaskConfig::data_root`]; only the
//! root and the external formatter invocation are configurable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default data root of a deployment.
pub const DEFAULT_DATA_ROOT: &str = "/data";

/// Pinned formatter package used by the markdown handler and prefetched by
/// the setup step.
pub const PRETTIER_PACKAGE: &str = "prettier@3.4.2";

/// Settings shared by every handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Directory every handler input and output lives under.
    pub data_root: PathBuf,
    /// External markdown formatter.
    pub formatter: FormatterConfig,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            formatter: FormatterConfig::default(),
        }
    }
}

impl TaskConfig {
    /// Build a configuration rooted at `data_root` with default formatter.
    pub fn with_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Resolve a fixed handler path under the data root.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.data_root.join(relative)
    }
}

/// How the markdown formatter is invoked.  The target file path is appended
/// as the final argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program: "npx".into(),
            // --no-install: the request path never downloads packages; the
            // setup step is responsible for prefetching the pinned version.
            args: vec![
                "--no-install".into(),
                PRETTIER_PACKAGE.into(),
                "--write".into(),
            ],
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_data_and_pinned_prettier() {
        let config = TaskConfig::default();
        assert_eq!(config.data_root, PathBuf::from("/data"));
        assert_eq!(config.path("dates.txt"), PathBuf::from("/data/dates.txt"));
        assert!(config.formatter.args.iter().any(|a| a == PRETTIER_PACKAGE));
        assert!(config.formatter.args.iter().any(|a| a == "--no-install"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TaskConfig = toml::from_str(
            r#"
            data_root = "/srv/data"

            [formatter]
            timeout_secs = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/data"));
        assert_eq!(config.formatter.program, "npx");
        assert_eq!(config.formatter.timeout_secs, 90);
        assert!(config.formatter.args.iter().any(|a| a == "--no-install"));
    }
}
