//! CLI entry point for DataOps.
//!
//! This binary provides the `dataops` command with subcommands for serving
//! the HTTP API, running a single task, preparing the host, and printing the
//! effective configuration.

mod cli;
mod config;
mod helpers;
mod setup;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dataops_agent::{LanguageModel, LlmClient};
use dataops_intent::TaskExecutor;
use dataops_web::WebServer;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::helpers::{env_non_empty, init_tracing, resolve_llm_config};
use crate::setup::{Datagen, SetupPlan, run_setup};

const DEFAULT_CONFIG_PATH: &str = "config/dataops.toml";

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env first so RUST_LOG set there applies.
    let dotenv = dotenvy::dotenv();
    init_tracing(&cli.log_level);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    // An explicitly passed config path must exist; the default is optional.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path, true)?,
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_PATH), false)?,
    };
    config.apply_env(env_non_empty)?;

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(&config).await
        }
        Commands::Run { task } => cmd_run(&config, &task).await,
        Commands::Setup {
            skip_formatter,
            datagen,
            email,
        } => {
            let plan = SetupPlan {
                data_root: config.data.root.clone(),
                prefetch_formatter: !skip_formatter,
                datagen: datagen.zip(email).map(|(script, email)| Datagen { script, email }),
            };
            run_setup(&plan).await
        }
        Commands::Status => cmd_status(&config),
    }
}

/// Build the executor over the configured model and data root.
fn build_executor(config: &AppConfig) -> Result<TaskExecutor> {
    let llm_config = resolve_llm_config(&config.llm, env_non_empty)?;
    let client = LlmClient::new(llm_config).context("failed to create LLM client")?;
    let model: Arc<dyn LanguageModel> = Arc::new(client);
    Ok(TaskExecutor::with_default_handlers(&config.task_config(), model))
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve(config: &AppConfig) -> Result<()> {
    let executor = Arc::new(build_executor(config)?);
    let server = WebServer::new(config.web_config(), executor, config.data.root.clone());

    println!();
    println!("  DataOps v{}", env!("CARGO_PKG_VERSION"));
    println!("  Listening on http://{}", server.addr());
    println!("  Data root: {}", config.data.root.display());
    println!();

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("web server error: {e}"))
}

// ---------------------------------------------------------------------------
// Subcommand: run
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig, task: &str) -> Result<()> {
    let executor = build_executor(config)?;
    let outcome = executor
        .execute(task)
        .await
        .context("task failed")?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

fn cmd_status(config: &AppConfig) -> Result<()> {
    let root = &config.data.root;

    println!();
    println!("  DataOps v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!(
        "  Data root:  {} ({})",
        root.display(),
        if root.is_dir() { "present" } else { "missing" }
    );
    println!("  Server:     {}:{}", config.server.bind, config.server.port);

    match resolve_llm_config(&config.llm, env_non_empty) {
        Ok(llm) => println!(
            "  LLM:        {:?} / {} (embeddings: {})",
            llm.provider, llm.default_model, llm.embedding_model
        ),
        Err(e) => println!("  LLM:        not configured ({e})"),
    }

    println!(
        "  Formatter:  {} {} (timeout {}s)",
        config.formatter.program,
        config.formatter.args.join(" "),
        config.formatter.timeout_secs
    );
    println!();
    println!("  Operations:");
    for op in dataops_tasks::Operation::ALL {
        println!("    {op}");
    }
    println!();
    Ok(())
}
