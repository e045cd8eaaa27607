//! Per-container ephemeral key management.
//!
//! A [`SecureKey`] never holds key bytes in its own fields. The key is
//! generated, handed to a [`SecretStorage`] backend, and the local buffer is
//! zeroized; every later use fetches the bytes from the backend and drops
//! them (zeroized) when the caller's cryptographic call is done.

use std::fmt;
use std::sync::Arc;

use memvault_core::Config;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::{Result, SecureDataError};
use crate::storage::{PlatformSecureStorage, SecretId, SecretStorage};

/// Default key size in bytes.
pub const DEFAULT_KEY_SIZE: usize = 32;

/// Domain separation label for derived key identifiers.
const KEY_ID_LABEL: &[u8] = b"memvault-key-id-v1";

/// Handle to one random symmetric key kept in a storage backend.
pub struct SecureKey {
    storage: Arc<dyn SecretStorage>,
    secret_id: SecretId,
    size: usize,
    disposed: bool,
}

impl SecureKey {
    /// Generate a 32-byte key in `storage`.
    pub fn new(storage: Arc<dyn SecretStorage>) -> Result<Self> {
        Self::with_size(storage, DEFAULT_KEY_SIZE)
    }

    /// Generate a `size`-byte key in `storage`. A size of 0 means the default.
    pub fn with_size(storage: Arc<dyn SecretStorage>, size: usize) -> Result<Self> {
        let size = if size == 0 { DEFAULT_KEY_SIZE } else { size };

        let ephemeral = crypto::random_bytes(size);
        let secret_id = storage.store(&ephemeral)?;
        drop(ephemeral);

        debug!(backend = storage.name(), size, "created key");
        Ok(Self {
            storage,
            secret_id,
            size,
            disposed: false,
        })
    }

    /// Generate a 32-byte key in the process-wide backend.
    pub fn generate() -> Result<Self> {
        Self::new(PlatformSecureStorage::global())
    }

    /// Generate a key of the configured size in the process-wide backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::with_size(PlatformSecureStorage::global(), config.keys.size)
    }

    /// Fetch the key bytes from the backend.
    ///
    /// Fails with [`SecureDataError::InvalidState`] when the backend no longer
    /// returns a key of the expected size; the instance is unusable from then on.
    pub fn key(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_live()?;

        match self.storage.retrieve(&self.secret_id) {
            Some(key) if key.len() == self.size => Ok(key),
            Some(_) => Err(SecureDataError::InvalidState(
                "stored key has an unexpected size".to_string(),
            )),
            None => Err(SecureDataError::InvalidState(
                "failed to retrieve key from secret storage".to_string(),
            )),
        }
    }

    /// Stable, non-reversible identifier for this key (a hash of its secret id).
    pub fn id(&self) -> Result<[u8; 32]> {
        self.ensure_live()?;
        Ok(crypto::sha256(&[KEY_ID_LABEL, self.secret_id.as_bytes()]))
    }

    /// Declared key size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Name of the backend holding the key.
    pub fn backend(&self) -> &str {
        self.storage.name()
    }

    /// The backend holding the key.
    pub fn storage(&self) -> Arc<dyn SecretStorage> {
        Arc::clone(&self.storage)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Remove the key from its backend. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.storage.remove(&self.secret_id);
        self.disposed = true;
        debug!(backend = self.storage.name(), "disposed key");
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(SecureDataError::Disposed("SecureKey"));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn secret_id(&self) -> &SecretId {
        &self.secret_id
    }
}

impl Drop for SecureKey {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SecureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureKey")
            .field("backend", &self.storage.name())
            .field("size", &self.size)
            .field("disposed", &self.disposed)
            .finish()
    }
}
