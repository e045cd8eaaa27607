//! Secret storage backends.
//!
//! A backend stores opaque secret blobs under opaque [`SecretId`]s. Key
//! managers keep only the id; the key bytes live in the backend and are
//! fetched for the duration of a single cryptographic call.
//!
//! Backends are registered in a [`StorageRegistry`] and ranked at startup.
//! The in-process [`FallbackStorage`] is always registered as the last resort.

mod fallback;
#[cfg(feature = "keychain")]
mod keychain;
mod registry;

use std::fmt;

use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::Result;

pub use fallback::{FallbackKeys, FallbackStorage, RECORD_OVERHEAD};
#[cfg(feature = "keychain")]
pub use keychain::KeychainStorage;
pub use registry::{PlatformSecureStorage, StorageRegistry, FALLBACK_BACKEND, KEYCHAIN_BACKEND};

/// Opaque handle naming one stored secret.
///
/// A random 128-bit identifier. `Display` and `Debug` never print the value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretId(Uuid);

impl SecretId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw 16-byte representation.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Canonical hyphenated form, for backends that key entries by string.
    #[cfg_attr(not(feature = "keychain"), allow(dead_code))]
    pub(crate) fn to_account(self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for SecretId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretId([REDACTED])")
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Storage port used by key managers.
///
/// Implementations must be safe for concurrent use by many key managers.
pub trait SecretStorage: Send + Sync {
    /// Short backend name used for registry lookups and diagnostics.
    fn name(&self) -> &str;

    /// Store `secret` under a fresh id.
    ///
    /// Fails with [`SecureDataError::Validation`](crate::SecureDataError::Validation)
    /// when `secret` is empty; no id is allocated in that case.
    fn store(&self, secret: &[u8]) -> Result<SecretId>;

    /// Retrieve the secret for `id`.
    ///
    /// Missing, tampered, or otherwise unreadable entries are reported as `None`.
    fn retrieve(&self, id: &SecretId) -> Option<Zeroizing<Vec<u8>>>;

    /// Remove the secret for `id`. Idempotent; any local copy is zeroized
    /// before this returns.
    fn remove(&self, id: &SecretId);
}
