//! Configuration loading and persistence.

use super::{Config, MAX_KEY_SIZE};
use crate::error::ConfigError;
use crate::{env, paths};
use std::fs;
use std::path::Path;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.keys.size == 0 {
            errors.push("Key size must be greater than 0".to_string());
        }
        if self.keys.size > MAX_KEY_SIZE {
            errors.push(format!(
                "Key size {} exceeds maximum of {}",
                self.keys.size, MAX_KEY_SIZE
            ));
        }

        if self.storage.keychain_service.trim().is_empty() {
            errors.push("Keychain service name must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to defaults if no file exists
    /// or the file cannot be parsed. Environment overrides are applied either way.
    pub fn load_or_default() -> Self {
        let mut config = match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("ignoring unreadable configuration: {e}");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// Honor `MEMVAULT_KEY_SIZE` and `MEMVAULT_KEYCHAIN_SERVICE`. The result
    /// still goes through [`validate`](Self::validate) before use.
    pub fn apply_env_overrides(&mut self) {
        if let Some(size) = env::get_usize(env::vars::MEMVAULT_KEY_SIZE) {
            self.keys.size = size;
        }
        if let Some(service) = env::get_var(env::vars::MEMVAULT_KEYCHAIN_SERVICE) {
            self.storage.keychain_service = service;
        }
    }
}
