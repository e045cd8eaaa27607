//! memvault CLI entry point.

use clap::Parser;
use memvault_cli::{init_tracing, load_config, run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let (config, load_error) = load_config(&config_path);
    init_tracing(cli.verbose, &config.logging);

    if let Some(e) = load_error {
        tracing::warn!("ignoring unreadable configuration at {}: {e}", config_path.display());
    }

    run(cli, &config_path, &config)
}
