//! OS keychain backend.
//!
//! Uses the operating system's credential store through the `keyring` crate:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Each secret is one entry under the configured service, with the secret id
//! as the account name and the hex-encoded secret as the password.

use keyring::Entry;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{SecretId, SecretStorage};
use crate::error::{Result, SecureDataError};
use crate::storage::registry::KEYCHAIN_BACKEND;

const PROBE_ACCOUNT: &str = "__memvault_probe__";

/// Secret storage backed by the OS credential store.
#[derive(Debug)]
pub struct KeychainStorage {
    service: String,
}

impl KeychainStorage {
    /// Confirm the credential store is usable by writing and deleting a
    /// sentinel entry, then return a backend for `service`.
    pub fn probe(service: impl Into<String>) -> Result<Self> {
        let service = service.into();
        let entry = Entry::new(&service, PROBE_ACCOUNT)
            .map_err(|e| SecureDataError::Keychain(format!("failed to create entry: {e}")))?;
        entry
            .set_password("probe")
            .map_err(|e| SecureDataError::Keychain(format!("keychain write failed: {e}")))?;
        if !deleted(entry.delete_password()) {
            warn!(service = %service, "keychain probe entry may be left behind");
        }

        debug!(service = %service, "OS keychain is available");
        Ok(Self { service })
    }

    /// Service name entries are filed under.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, id: &SecretId) -> Option<Entry> {
        Entry::new(&self.service, &id.to_account()).ok()
    }
}

impl SecretStorage for KeychainStorage {
    fn name(&self) -> &str {
        KEYCHAIN_BACKEND
    }

    fn store(&self, secret: &[u8]) -> Result<SecretId> {
        if secret.is_empty() {
            return Err(SecureDataError::Validation(
                "secret must not be empty".to_string(),
            ));
        }

        let id = SecretId::new();
        let entry = Entry::new(&self.service, &id.to_account())
            .map_err(|e| SecureDataError::Keychain(format!("failed to create entry: {e}")))?;

        let mut encoded = Zeroizing::new(vec![0u8; secret.len() * 2]);
        hex::encode_to_slice(secret, &mut encoded)
            .map_err(|e| SecureDataError::Keychain(format!("failed to encode secret: {e}")))?;
        let encoded = std::str::from_utf8(&encoded)
            .map_err(|e| SecureDataError::Keychain(format!("failed to encode secret: {e}")))?;
        entry
            .set_password(encoded)
            .map_err(|e| SecureDataError::Keychain(format!("keychain write failed: {e}")))?;
        Ok(id)
    }

    fn retrieve(&self, id: &SecretId) -> Option<Zeroizing<Vec<u8>>> {
        let entry = self.entry(id)?;
        let encoded = match entry.get_password() {
            Ok(password) => Zeroizing::new(password),
            Err(keyring::Error::NoEntry) => return None,
            Err(e) => {
                warn!("keychain read failed: {e}");
                return None;
            }
        };
        hex::decode(encoded.as_str()).ok().map(Zeroizing::new)
    }

    fn remove(&self, id: &SecretId) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        deleted(entry.delete_password());
    }
}

/// Whether a delete left no entry behind. Failures are logged.
fn deleted(result: keyring::Result<()>) -> bool {
    match result {
        Ok(()) | Err(keyring::Error::NoEntry) => true,
        Err(e) => {
            warn!("keychain delete failed: {e}");
            false
        }
    }
}
