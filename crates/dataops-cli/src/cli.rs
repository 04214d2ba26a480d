//! CLI argument definitions for DataOps.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// DataOps -- run file-processing tasks described in plain language.
#[derive(Parser)]
#[command(
    name = "dataops",
    version,
    about = "DataOps -- LLM-routed file-processing tasks",
    long_about = "Classifies a free-text task description with a language model and runs \
                  the matching file transformation under the data root."
)]
pub struct Cli {
    /// Path to the TOML configuration file [default: config/dataops.toml,
    /// optional].
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Address to bind the HTTP server to.
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on.
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Classify and run a single task, printing the outcome as JSON.
    Run {
        /// The task description.
        task: String,
    },

    /// Prepare the host: prefetch the formatter and optionally generate data.
    Setup {
        /// Do not prefetch the markdown formatter.
        #[arg(long)]
        skip_formatter: bool,

        /// Local data-generation script, run with `uv run`.
        #[arg(long, requires = "email")]
        datagen: Option<PathBuf>,

        /// Email address passed to the data-generation script.
        #[arg(long, requires = "datagen")]
        email: Option<String>,
    },

    /// Show the effective configuration.
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_global_config() {
        let cli = Cli::parse_from(["dataops", "run", "count wednesdays", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Run { ref task } if task == "count wednesdays"));
    }

    #[test]
    fn datagen_requires_email() {
        let res = Cli::try_parse_from(["dataops", "setup", "--datagen", "gen.py"]);
        assert!(res.is_err());
    }
}
