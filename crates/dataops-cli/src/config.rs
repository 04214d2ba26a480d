//! Application configuration.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables (after `.env` has been read by `dotenvy`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use dataops_tasks::{FormatterConfig, TaskConfig};
use dataops_web::WebConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub llm: LlmSettings,
    pub formatter: FormatterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let web = WebConfig::default();
        Self {
            bind: web.bind_addr,
            port: web.port,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub root: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            root: TaskConfig::default().data_root,
        }
    }
}

/// Model selection.  Credentials only ever come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// `aiproxy`, `openai` or `anthropic`; auto-detected from credentials
    /// when unset.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub embedding_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load `path` if it exists.  A missing file yields defaults unless
    /// `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply `DATAOPS_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(root) = lookup("DATAOPS_DATA_ROOT") {
            self.data.root = PathBuf::from(root);
        }
        if let Some(bind) = lookup("DATAOPS_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("DATAOPS_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("DATAOPS_PORT is not a valid port: {port}"))?;
        }
        if let Some(model) = lookup("DATAOPS_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = lookup("DATAOPS_API_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = lookup("DATAOPS_EMBEDDING_MODEL") {
            self.llm.embedding_model = Some(model);
        }
        if let Some(provider) = lookup("DATAOPS_PROVIDER") {
            self.llm.provider = Some(provider);
        }

        // `/read` only accepts absolute paths under the root.
        if self.data.root.is_relative() {
            self.data.root = std::path::absolute(&self.data.root).with_context(|| {
                format!("failed to resolve data root {}", self.data.root.display())
            })?;
            debug!(root = %self.data.root.display(), "relative data root made absolute");
        }
        Ok(())
    }

    pub fn task_config(&self) -> TaskConfig {
        TaskConfig {
            data_root: self.data.root.clone(),
            formatter: self.formatter.clone(),
        }
    }

    pub fn web_config(&self) -> WebConfig {
        WebConfig {
            bind_addr: self.server.bind.clone(),
            port: self.server.port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_optional_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("none.toml"), false).unwrap();
        assert_eq!(config.data.root, PathBuf::from("/data"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.formatter.program, "npx");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(&dir.path().join("none.toml"), true).is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataops.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8000\n\n[llm]\nmodel = \"gpt-4o-mini\"\n\n[formatter]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = AppConfig::load(&path, true).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.formatter.timeout_secs, 5);
        assert_eq!(config.formatter.program, "npx");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(AppConfig::load(&path, false).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("DATAOPS_DATA_ROOT", "/srv/data"),
                ("DATAOPS_BIND", "0.0.0.0"),
                ("DATAOPS_PORT", "8000"),
                ("DATAOPS_MODEL", "gpt-4o-mini"),
            ]))
            .unwrap();

        assert_eq!(config.task_config().data_root, PathBuf::from("/srv/data"));
        let web = config.web_config();
        assert_eq!((web.bind_addr.as_str(), web.port), ("0.0.0.0", 8000));
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn relative_data_root_is_made_absolute() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[("DATAOPS_DATA_ROOT", "./data")]))
            .unwrap();

        let root = config.task_config().data_root;
        assert!(root.is_absolute());
        assert_eq!(root, std::env::current_dir().unwrap().join("data"));

        let inside = format!("{}/dates.txt", root.display());
        assert!(dataops_tasks::fsio::confine(&root, &inside).is_ok());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(lookup(&[("DATAOPS_PORT", "eighty")])).is_err());
    }
}
