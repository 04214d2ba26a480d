//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, LLM provider resolution, and environment
//! variable utilities.

use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dataops_agent::LlmClientConfig;

use crate::config::LlmSettings;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// LLM provider resolution
// ---------------------------------------------------------------------------

const AIPROXY_BASE_URL: &str = "https://api.aiproxy.xyz/v1";
const DEFAULT_MODEL_OPENAI: &str = "gpt-4o-mini";
const DEFAULT_MODEL_ANTHROPIC: &str = "claude-sonnet-4-20250514";

/// Resolve the LLM configuration from settings and credentials.
///
/// Credentials are checked in order `AIPROXY_TOKEN` -> `OPENAI_API_KEY` ->
/// `ANTHROPIC_API_KEY` unless `settings.provider` names one explicitly.
pub fn resolve_llm_config(
    settings: &LlmSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<LlmClientConfig> {
    let model = |default: &str| settings.model.clone().unwrap_or_else(|| default.to_owned());

    let try_aiproxy = || -> Option<LlmClientConfig> {
        let token = lookup("AIPROXY_TOKEN")?;
        let base = settings
            .base_url
            .clone()
            .unwrap_or_else(|| AIPROXY_BASE_URL.to_owned());
        Some(LlmClientConfig::openai_compatible(
            token,
            model(DEFAULT_MODEL_OPENAI),
            base,
        ))
    };

    let try_openai = || -> Option<LlmClientConfig> {
        let key = lookup("OPENAI_API_KEY")?;
        let mut cfg = LlmClientConfig::openai(key, model(DEFAULT_MODEL_OPENAI));
        if let Some(url) = &settings.base_url {
            cfg.base_url = url.clone();
        }
        Some(cfg)
    };

    let try_anthropic = || -> Option<LlmClientConfig> {
        let key = lookup("ANTHROPIC_API_KEY")?;
        let mut cfg = LlmClientConfig::anthropic(key, model(DEFAULT_MODEL_ANTHROPIC));
        if let Some(url) = &settings.base_url {
            cfg.base_url = url.clone();
        }
        Some(cfg)
    };

    let resolved = match settings.provider.as_deref().map(str::to_lowercase).as_deref() {
        Some("aiproxy") => try_aiproxy().ok_or_else(|| no_key("aiproxy", "AIPROXY_TOKEN"))?,
        Some("openai") => try_openai().ok_or_else(|| no_key("openai", "OPENAI_API_KEY"))?,
        Some("anthropic") => {
            try_anthropic().ok_or_else(|| no_key("anthropic", "ANTHROPIC_API_KEY"))?
        }
        Some(other) => bail!("unknown LLM provider `{other}` (expected aiproxy, openai or anthropic)"),
        None => match try_aiproxy().or_else(try_openai).or_else(try_anthropic) {
            Some(cfg) => cfg,
            None => bail!(
                "no LLM credentials found; set AIPROXY_TOKEN, OPENAI_API_KEY or ANTHROPIC_API_KEY"
            ),
        },
    };

    let mut cfg = resolved;
    if let Some(embedding) = &settings.embedding_model {
        cfg.embedding_model = embedding.clone();
    }
    if let Some(timeout) = settings.timeout_secs {
        cfg.timeout_secs = timeout;
    }

    info!(provider = ?cfg.provider, model = %cfg.default_model, "LLM provider resolved");
    Ok(cfg)
}

fn no_key(provider: &str, env_var: &str) -> anyhow::Error {
    anyhow::anyhow!("{provider} provider selected but {env_var} is not set")
}

/// Read a non-empty environment variable, returning `None` if unset or empty.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataops_agent::LlmProvider;

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn aiproxy_token_wins_auto_detection() {
        let cfg = resolve_llm_config(
            &LlmSettings::default(),
            env(&[("AIPROXY_TOKEN", "tok"), ("OPENAI_API_KEY", "sk")]),
        )
        .unwrap();
        assert_eq!(cfg.provider, LlmProvider::OpenAI);
        assert_eq!(cfg.api_key, "tok");
        assert_eq!(cfg.base_url, AIPROXY_BASE_URL);
        assert_eq!(cfg.default_model, "gpt-4o-mini");
    }

    #[test]
    fn explicit_provider_is_honoured() {
        let settings = LlmSettings {
            provider: Some("Anthropic".into()),
            ..LlmSettings::default()
        };
        let cfg = resolve_llm_config(
            &settings,
            env(&[("AIPROXY_TOKEN", "tok"), ("ANTHROPIC_API_KEY", "ak")]),
        )
        .unwrap();
        assert_eq!(cfg.provider, LlmProvider::Anthropic);
        assert_eq!(cfg.api_key, "ak");
    }

    #[test]
    fn overrides_apply() {
        let settings = LlmSettings {
            model: Some("gpt-4.1".into()),
            base_url: Some("http://localhost:8080/v1".into()),
            embedding_model: Some("text-embedding-3-large".into()),
            timeout_secs: Some(30),
            ..LlmSettings::default()
        };
        let cfg = resolve_llm_config(&settings, env(&[("OPENAI_API_KEY", "sk")])).unwrap();
        assert_eq!(cfg.default_model, "gpt-4.1");
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
        assert_eq!(cfg.embedding_model, "text-embedding-3-large");
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn missing_credentials_are_an_error() {
        assert!(resolve_llm_config(&LlmSettings::default(), env(&[])).is_err());

        let settings = LlmSettings {
            provider: Some("openai".into()),
            ..LlmSettings::default()
        };
        let err = resolve_llm_config(&settings, env(&[("AIPROXY_TOKEN", "tok")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let settings = LlmSettings {
            provider: Some("mystery".into()),
            ..LlmSettings::default()
        };
        assert!(resolve_llm_config(&settings, env(&[("OPENAI_API_KEY", "sk")])).is_err());
    }
}
