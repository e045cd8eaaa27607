//! Error types for secure containers and their storage backends.

use memvault_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while protecting values in memory.
#[derive(Debug, Error)]
pub enum SecureDataError {
    /// Invalid arguments: empty secret, wrong key length, undecodable payload.
    #[error("Validation error: {0}")]
    Validation(String),

    /// AEAD tag verification failed. Never accompanied by plaintext.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// A named storage backend is not registered or not available.
    #[error("Storage backend not found: {0}")]
    NotFound(String),

    /// The key manager or container has already been disposed.
    #[error("Use of disposed {0}")]
    Disposed(&'static str),

    /// The key manager could not recover a usable key.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result alias for secure data operations.
pub type Result<T> = std::result::Result<T, SecureDataError>;
