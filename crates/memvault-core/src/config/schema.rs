//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Default key size for key managers, in bytes.
pub const DEFAULT_KEY_SIZE: usize = 32;

/// Largest key size a key manager may be configured with, in bytes.
pub const MAX_KEY_SIZE: usize = 1024;

/// Default service name for OS keychain entries.
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "memvault";

/// Main memvault configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Secret storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key manager settings.
    #[serde(default)]
    pub keys: KeyConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secret storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Probe every registered backend and use the highest-ranked available one.
    #[default]
    Auto,
    /// Always use the in-process fallback backend.
    Fallback,
    /// Require the OS keychain backend.
    Keychain,
}

impl BackendPreference {
    /// Registry name of the backend this preference pins, if any.
    pub fn backend_name(&self) -> Option<&'static str> {
        match self {
            BackendPreference::Auto => None,
            BackendPreference::Fallback => Some("fallback"),
            BackendPreference::Keychain => Some("keychain"),
        }
    }
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: BackendPreference,

    /// Service name used for OS keychain entries.
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            keychain_service: default_keychain_service(),
        }
    }
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

/// Key manager configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Size in bytes of keys generated by standalone key managers.
    #[serde(default = "default_key_size")]
    pub size: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            size: default_key_size(),
        }
    }
}

fn default_key_size() -> usize {
    DEFAULT_KEY_SIZE
}

/// Logging configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
