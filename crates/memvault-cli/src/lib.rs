//! memvault command-line interface.

pub mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use memvault_core::config::{LogLevel, LoggingConfig};
use memvault_core::{paths, Config, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// memvault - encrypted in-memory secret containers
#[derive(Parser)]
#[command(name = "memvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "MEMVAULT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file named on the command line, else the default location.
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(paths::expand_tilde(&path.to_string_lossy())),
            None => Ok(paths::config_file()?),
        }
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Check secret storage backends and run a self-test
    Doctor(commands::doctor::DoctorArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Config(args) => commands::config::run(args, config_path),
        Commands::Doctor(args) => commands::doctor::run(args, config_path, config),
        Commands::Version => {
            println!("memvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load the config file at `path` and apply environment overrides. A missing
/// file yields defaults; any other failure yields defaults plus the error, so
/// logging can still start.
pub fn load_config(path: &Path) -> (Config, Option<ConfigError>) {
    let (mut config, error) = match Config::load(path) {
        Ok(config) => (config, None),
        Err(ConfigError::NotFound(_)) => (Config::default(), None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_env_overrides();
    (config, error)
}

/// Filter directive for the memvault crates. Each `-v` raises the configured
/// level one step.
pub fn filter_directive(verbose: u8, level: LogLevel) -> String {
    let level = match verbose {
        0 => level,
        1 => match level {
            LogLevel::Trace | LogLevel::Debug => LogLevel::Trace,
            _ => LogLevel::Debug,
        },
        _ => LogLevel::Trace,
    };
    format!("memvault={}", level.as_str())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the computed filter.
pub fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter_directive(verbose, logging.level).into());

    let json = logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
