//! Shared helpers for the memvault integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use memvault_secrets::{
    FallbackKeys, FallbackStorage, Result, SecretId, SecretStorage, SecureDataError,
};
use zeroize::Zeroizing;

/// Fallback backend with its own freshly generated keys.
pub fn fallback_storage() -> Arc<FallbackStorage> {
    Arc::new(FallbackStorage::new(Arc::new(FallbackKeys::generate())))
}

/// Plaintext backend whose entries tests can damage, to observe how key
/// managers and containers react to a misbehaving store.
#[derive(Default)]
pub struct DamageableStorage {
    entries: Mutex<HashMap<SecretId, Vec<u8>>>,
}

impl DamageableStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flip the low bit of the first byte of every entry.
    pub fn flip_bits(&self) {
        for entry in self.entries.lock().unwrap().values_mut() {
            entry[0] ^= 0x01;
        }
    }

    /// Drop the last byte of every entry.
    pub fn truncate(&self) {
        for entry in self.entries.lock().unwrap().values_mut() {
            entry.pop();
        }
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl SecretStorage for DamageableStorage {
    fn name(&self) -> &str {
        "damageable"
    }

    fn store(&self, secret: &[u8]) -> Result<SecretId> {
        if secret.is_empty() {
            return Err(SecureDataError::Validation("secret must not be empty".to_string()));
        }
        let id = SecretId::new();
        self.entries.lock().unwrap().insert(id, secret.to_vec());
        Ok(id)
    }

    fn retrieve(&self, id: &SecretId) -> Option<Zeroizing<Vec<u8>>> {
        self.entries
            .lock()
            .unwrap()
            .get(id)
            .map(|entry| Zeroizing::new(entry.clone()))
    }

    fn remove(&self, id: &SecretId) {
        self.entries.lock().unwrap().remove(id);
    }
}
