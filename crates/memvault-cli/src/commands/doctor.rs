//! Diagnostic commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context};
use clap::Args;
use console::{style, Emoji};
use memvault_core::{env, paths, Config, ConfigError};
use memvault_secrets::{
    SecretStorage, SecureBytes, SecureDataError, SecureString, StorageRegistry, TextEncoding,
};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {
    /// Also run the container self-test against the selected backend
    #[arg(long)]
    pub full: bool,
}

/// Run the doctor command.
pub fn run(args: DoctorArgs, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    println!("memvault doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    println!("Checking directories...");
    match paths::base_dir() {
        Ok(dir) if dir.exists() => {
            println!("  {} Base directory exists: {}", style(CHECK).green(), dir.display());
        }
        Ok(dir) => {
            println!("  {} Base directory missing: {}", style(WARN).yellow(), dir.display());
            warnings += 1;
        }
        Err(e) => {
            println!("  {} Failed to determine base directory: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    println!("\nChecking configuration...");
    match Config::load(config_path) {
        Ok(loaded) => {
            println!("  {} Configuration loaded: {}", style(CHECK).green(), config_path.display());
            match loaded.validate() {
                Ok(()) => println!("  {} Configuration valid", style(CHECK).green()),
                Err(e) => {
                    println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
        }
        Err(ConfigError::NotFound(_)) => {
            println!("  {} Configuration file not found, using defaults", style(WARN).yellow());
            println!("    Run 'memvault config init' to create one");
            warnings += 1;
        }
        Err(e) => {
            println!("  {} Configuration error: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    println!("\nChecking secret storage...");
    let registry = StorageRegistry::from_config(config);
    println!("  Registered backends (best first): {}", registry.names().join(", "));
    println!(
        "  Configured backend: {}",
        config.storage.backend.backend_name().unwrap_or("auto")
    );
    if env::get_bool(env::vars::MEMVAULT_FORCE_FALLBACK) {
        println!(
            "  {} {} is set; the fallback backend is forced",
            style(WARN).yellow(),
            env::vars::MEMVAULT_FORCE_FALLBACK
        );
        warnings += 1;
    }

    let storage = match registry.select_preferred(config.storage.backend) {
        Ok(storage) => {
            println!("  {} Selected backend: {}", style(CHECK).green(), storage.name());
            Some(storage)
        }
        Err(e) => {
            println!("  {} Configured backend unavailable: {}", style(CROSS).red(), e);
            errors += 1;
            None
        }
    };

    if args.full {
        println!("\nRunning container self-test...");
        match &storage {
            Some(storage) => {
                for (name, result) in self_test(storage) {
                    match result {
                        Ok(()) => println!("  {} {}", style(CHECK).green(), name),
                        Err(e) => {
                            println!("  {} {}: {:#}", style(CROSS).red(), name, e);
                            errors += 1;
                        }
                    }
                }
            }
            None => {
                println!("  {} Skipped: no usable backend", style(WARN).yellow());
                warnings += 1;
            }
        }
    }

    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}

/// Exercise the containers against `storage`, one result per check.
pub fn self_test(storage: &Arc<dyn SecretStorage>) -> Vec<(&'static str, anyhow::Result<()>)> {
    vec![
        ("bytes round trip", check_round_trip(storage)),
        ("append", check_append(storage)),
        ("text split", check_split(storage)),
        ("dispose", check_dispose(storage)),
    ]
}

fn check_round_trip(storage: &Arc<dyn SecretStorage>) -> anyhow::Result<()> {
    let mut a = SecureBytes::with_storage(Arc::clone(storage), b"doctor")?;
    let mut b = SecureBytes::with_storage(Arc::clone(storage), b"doctor")?;
    a.set(&[0x00, 0x7F, 0xFF, 0x10])?;
    b.set(&[0x00, 0x7F, 0xFF, 0x10])?;

    ensure!(a.get()?.as_slice() == [0x00, 0x7F, 0xFF, 0x10], "decrypted bytes differ");
    ensure!(a.equals(&b)?, "equal buffers under distinct keys compare unequal");
    Ok(())
}

fn check_append(storage: &Arc<dyn SecretStorage>) -> anyhow::Result<()> {
    let mut bytes = SecureBytes::with_storage(Arc::clone(storage), b"")?;
    bytes.set(b"abc")?;
    bytes.append(b"def")?;
    ensure!(bytes.get()?.as_slice() == b"abcdef", "append did not concatenate");
    ensure!(bytes.len() == 6, "append reported length {}", bytes.len());
    Ok(())
}

fn check_split(storage: &Arc<dyn SecretStorage>) -> anyhow::Result<()> {
    let mut text = SecureString::with_storage(Arc::clone(storage), TextEncoding::Utf8, b"")?;
    text.set_str("hello")?;

    let parts = text.split(&['l'])?;
    let exposed = parts
        .iter()
        .map(|part| part.expose().map(|s| s.to_string()))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decrypt split parts")?;
    ensure!(exposed == ["he", "", "o"], "split produced unexpected parts ({} total)", exposed.len());
    Ok(())
}

fn check_dispose(storage: &Arc<dyn SecretStorage>) -> anyhow::Result<()> {
    let mut bytes = SecureBytes::with_storage(Arc::clone(storage), b"")?;
    bytes.set(b"short-lived")?;
    bytes.dispose();
    ensure!(
        matches!(bytes.get(), Err(SecureDataError::Disposed(_))),
        "disposed container still readable"
    );
    Ok(())
}
