//! CLI routing and command integration tests.
//!
//! Commands run in-process against config files in temporary directories.

use clap::Parser;
use memvault_cli::{load_config, run, Cli};
use memvault_core::config::BackendPreference;
use memvault_core::Config;
use tempfile::TempDir;

fn run_args(args: &[&str]) -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(args.iter().copied())?;
    let path = cli.config_path()?;
    let (config, _) = load_config(&path);
    run(cli, &path, &config)
}

#[test]
fn test_version() {
    run_args(&["memvault", "version"]).unwrap();
}

#[test]
fn test_config_init_set_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memvault.json5");
    let path_str = path.to_str().unwrap();

    run_args(&["memvault", "-c", path_str, "config", "init"]).unwrap();
    assert!(path.exists());
    assert!(run_args(&["memvault", "-c", path_str, "config", "init"]).is_err());

    run_args(&["memvault", "-c", path_str, "config", "set", "storage.backend", "fallback"]).unwrap();
    run_args(&["memvault", "-c", path_str, "config", "validate"]).unwrap();
    assert_eq!(
        Config::load(&path).unwrap().storage.backend,
        BackendPreference::Fallback
    );
}

#[test]
fn test_doctor_full_with_fallback_backend() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memvault.json5");
    let mut config = Config::default();
    config.storage.backend = BackendPreference::Fallback;
    config.save(&path).unwrap();

    run_args(&["memvault", "--config", path.to_str().unwrap(), "doctor", "--full"]).unwrap();
}

#[test]
fn test_doctor_reports_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memvault.json5");
    std::fs::write(&path, r#"{ keys: { size: 0 } }"#).unwrap();

    assert!(run_args(&["memvault", "--config", path.to_str().unwrap(), "doctor"]).is_err());
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["memvault", "secrets", "list"]).is_err());
}
