//! CPM console command-line entry point
//!
//! Replays interaction scenarios against the console with recording effects
//! and prints the resolved configuration.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpm_console::config::ConsoleConfig;
use cpm_console::replay;
use cpm_core::Locale;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cpm-console")]
#[command(about = "CPM admin console interaction layer tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// UI language code (en, cs)
    #[arg(short, long, global = true)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scenario and print its report
    Replay {
        /// Scenario file
        scenario: PathBuf,

        /// Print the report as a single line
        #[arg(long)]
        compact: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref(), cli.locale.as_deref())?;

    match cli.command {
        Commands::Replay { scenario, compact } => {
            let report = replay::replay_file(&scenario, config)
                .with_context(|| format!("replaying {}", scenario.display()))?;
            let rendered = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{rendered}");

            if report.passed() {
                tracing::info!(scenario = %report.name, "scenario passed");
                Ok(ExitCode::SUCCESS)
            } else {
                for failure in &report.failures {
                    tracing::error!(scenario = %report.name, "{failure}");
                }
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>, locale: Option<&str>) -> Result<ConsoleConfig> {
    let mut config = match path {
        Some(path) => ConsoleConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let mut config = ConsoleConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(code) = locale {
        config.locale = Locale::from_code(code);
    }
    Ok(config)
}
