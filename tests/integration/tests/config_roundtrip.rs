//! Config save/load roundtrip integration tests.

use std::path::Path;

use memvault_core::config::{BackendPreference, LogLevel};
use memvault_core::{Config, ConfigError};
use memvault_secrets::{SecureKey, StorageRegistry};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memvault.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.storage.backend, config.storage.backend);
    assert_eq!(loaded.storage.keychain_service, config.storage.keychain_service);
    assert_eq!(loaded.keys.size, config.keys.size);
    assert_eq!(loaded.logging.level, config.logging.level);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("memvault.json5");

    let mut config = Config::default();
    config.storage.backend = BackendPreference::Fallback;
    config.keys.size = 64;
    config.logging.level = LogLevel::Debug;
    config.logging.json = true;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.storage.backend, BackendPreference::Fallback);
    assert_eq!(loaded.keys.size, 64);
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert!(loaded.logging.json);
}

#[test]
fn test_json5_with_comments() {
    let config = Config::parse(
        r#"{
            // keep keys in process memory only
            storage: { backend: "fallback" },
            keys: { size: 48, },
        }"#,
    )
    .unwrap();
    assert_eq!(config.storage.backend, BackendPreference::Fallback);
    assert_eq!(config.keys.size, 48);
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/memvault.json5"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
    assert!(Config::parse(r#"{ storage: { backend: "enclave" } }"#).is_err());
}

#[test]
fn test_invalid_key_size_rejected_by_key_manager() {
    let mut config = Config::default();
    config.keys.size = 0;
    assert!(SecureKey::from_config(&config).is_err());
}

#[test]
fn test_fallback_preference_selects_fallback() {
    let mut config = Config::default();
    config.storage.backend = BackendPreference::Fallback;

    let registry = StorageRegistry::from_config(&config);
    let storage = registry.select_preferred(config.storage.backend).unwrap();
    assert_eq!(storage.name(), "fallback");
    assert_eq!(registry.names().last(), Some(&"fallback"));
}
