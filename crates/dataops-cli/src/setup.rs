//! `dataops setup` -- one-off host preparation.
//!
//! Prefetches the pinned formatter so the request path can run it with
//! `--no-install`, and optionally runs a local data-generation script.
//! Nothing here runs on the request path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use dataops_tasks::config::PRETTIER_PACKAGE;
use dataops_tasks::process::run_command;

/// Subprocess limit for installs and data generation.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(600);

/// What `setup` should do.
#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub data_root: PathBuf,
    pub prefetch_formatter: bool,
    pub datagen: Option<Datagen>,
}

/// A local data-generation script and the email it is seeded with.
#[derive(Debug, Clone)]
pub struct Datagen {
    pub script: PathBuf,
    pub email: String,
}

/// Arguments for `npx` that download and cache the pinned formatter.
pub fn formatter_prefetch_args() -> Vec<String> {
    vec!["--yes".into(), PRETTIER_PACKAGE.into(), "--version".into()]
}

/// Arguments for `uv run` that execute the datagen script.
pub fn datagen_args(datagen: &Datagen, data_root: &Path) -> Vec<String> {
    vec![
        "run".into(),
        datagen.script.to_string_lossy().into_owned(),
        datagen.email.clone(),
        "--root".into(),
        data_root.to_string_lossy().into_owned(),
    ]
}

/// Reject anything that is not an existing local file.
pub fn validate_script(script: &Path) -> Result<()> {
    let raw = script.to_string_lossy();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        bail!("datagen script must be a local file, not a URL: {raw}");
    }
    if !script.is_file() {
        bail!("datagen script {} does not exist", script.display());
    }
    Ok(())
}

pub async fn run_setup(plan: &SetupPlan) -> Result<()> {
    if let Some(datagen) = &plan.datagen {
        validate_script(&datagen.script)?;
    }

    tokio::fs::create_dir_all(&plan.data_root)
        .await
        .with_context(|| format!("failed to create data root {}", plan.data_root.display()))?;

    if plan.prefetch_formatter {
        println!("  Prefetching {PRETTIER_PACKAGE}...");
        let out = run_command("npx", &formatter_prefetch_args(), None, SETUP_TIMEOUT)
            .await
            .context("failed to prefetch the markdown formatter")?;
        info!(version = %out.stdout.trim(), "formatter ready");
        println!("  Formatter ready ({}).", out.stdout.trim());
    }

    if let Some(datagen) = &plan.datagen {
        println!("  Generating data with {}...", datagen.script.display());
        run_command(
            "uv",
            &datagen_args(datagen, &plan.data_root),
            None,
            SETUP_TIMEOUT,
        )
        .await
        .context("data generation failed")?;
        info!(root = %plan.data_root.display(), "data generated");
        println!("  Data written to {}.", plan.data_root.display());
    }

    println!("  Setup complete.");
    Ok(())
}
