//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get an environment variable as a usize.
pub fn get_usize(name: &str) -> Option<usize> {
    get_var(name).and_then(|v| v.parse().ok())
}

/// Environment variable names understood by memvault.
pub mod vars {
    /// Memvault home directory override.
    pub const MEMVAULT_HOME: &str = "MEMVAULT_HOME";

    /// Memvault config file override.
    pub const MEMVAULT_CONFIG: &str = "MEMVAULT_CONFIG";

    /// Forces the in-process fallback storage backend when set to a truthy value.
    pub const MEMVAULT_FORCE_FALLBACK: &str = "MEMVAULT_FORCE_FALLBACK";

    /// Overrides `keys.size`.
    pub const MEMVAULT_KEY_SIZE: &str = "MEMVAULT_KEY_SIZE";

    /// Overrides `storage.keychain_service`.
    pub const MEMVAULT_KEYCHAIN_SERVICE: &str = "MEMVAULT_KEYCHAIN_SERVICE";
}
