//! Portable in-process secret storage.
//!
//! Each record is `IV (16) || AES-256-CBC ciphertext || HMAC-SHA-256 (32)`,
//! where the MAC covers `IV || ciphertext`. The encryption and MAC keys are
//! held in a [`FallbackKeys`] value that lives as long as the storage does.
//!
//! The process-wide keys returned by [`FallbackKeys::process`] are generated
//! once and never rotated.

use std::fmt;
use std::sync::Arc;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{SecretId, SecretStorage};
use crate::error::{Result, SecureDataError};
use crate::storage::registry::FALLBACK_BACKEND;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_SIZE: usize = 16;
const MAC_SIZE: usize = 32;
const FALLBACK_KEY_SIZE: usize = 32;

/// Bytes a record adds on top of its ciphertext (IV plus MAC tag).
pub const RECORD_OVERHEAD: usize = IV_SIZE + MAC_SIZE;

static PROCESS_KEYS: Lazy<Arc<FallbackKeys>> = Lazy::new(|| Arc::new(FallbackKeys::generate()));

/// Encryption and MAC keys for [`FallbackStorage`].
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FallbackKeys {
    encryption: [u8; FALLBACK_KEY_SIZE],
    mac: [u8; FALLBACK_KEY_SIZE],
}

impl FallbackKeys {
    /// Generate a fresh key pair from the CSPRNG.
    pub fn generate() -> Self {
        let mut keys = Self {
            encryption: [0u8; FALLBACK_KEY_SIZE],
            mac: [0u8; FALLBACK_KEY_SIZE],
        };
        rand::thread_rng().fill_bytes(&mut keys.encryption);
        rand::thread_rng().fill_bytes(&mut keys.mac);
        keys
    }

    /// Use caller-supplied keys, e.g. deterministic keys in tests.
    pub fn from_bytes(encryption: [u8; 32], mac: [u8; 32]) -> Self {
        Self { encryption, mac }
    }

    /// The process-wide keys, created on first use and shared read-only afterwards.
    pub fn process() -> Arc<FallbackKeys> {
        Arc::clone(&PROCESS_KEYS)
    }
}

impl fmt::Debug for FallbackKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FallbackKeys([REDACTED])")
    }
}

/// Concurrent in-memory secret store with encrypt-then-MAC records.
pub struct FallbackStorage {
    keys: Arc<FallbackKeys>,
    records: DashMap<SecretId, Zeroizing<Vec<u8>>>,
}

impl FallbackStorage {
    /// Create an empty store sealing records under `keys`.
    pub fn new(keys: Arc<FallbackKeys>) -> Self {
        Self {
            keys,
            records: DashMap::new(),
        }
    }

    /// Create an empty store using the process-wide keys.
    pub fn with_process_keys() -> Self {
        Self::new(FallbackKeys::process())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn compute_mac(&self, data: &[u8]) -> Option<[u8; MAC_SIZE]> {
        let mut mac = HmacSha256::new_from_slice(&self.keys.mac).ok()?;
        mac.update(data);
        Some(mac.finalize().into_bytes().into())
    }

    fn seal_record(&self, secret: &[u8]) -> Result<Vec<u8>> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(&self.keys.encryption, &iv)
            .map_err(|e| SecureDataError::EncryptionFailed(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(secret);

        let mut record = Vec::with_capacity(RECORD_OVERHEAD + ciphertext.len());
        record.extend_from_slice(&iv);
        record.extend_from_slice(&ciphertext);

        let tag = self.compute_mac(&record).ok_or_else(|| {
            SecureDataError::EncryptionFailed("failed to initialize HMAC".to_string())
        })?;
        record.extend_from_slice(&tag);
        Ok(record)
    }

    fn open_record(&self, record: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        if record.len() <= RECORD_OVERHEAD {
            return None;
        }

        let (authenticated, stored_tag) = record.split_at(record.len() - MAC_SIZE);
        let computed_tag = self.compute_mac(authenticated)?;
        if !bool::from(computed_tag.as_slice().ct_eq(stored_tag)) {
            warn!("fallback record failed integrity check; treating as absent");
            return None;
        }

        let (iv, ciphertext) = authenticated.split_at(IV_SIZE);
        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        let plain_len = Aes256CbcDec::new_from_slices(&self.keys.encryption, iv)
            .ok()?
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .ok()?
            .len();
        buffer.truncate(plain_len);
        Some(buffer)
    }

    #[cfg(test)]
    pub(crate) fn with_record_mut<F: FnOnce(&mut Vec<u8>)>(&self, id: &SecretId, f: F) -> bool {
        match self.records.get_mut(id) {
            Some(mut record) => {
                f(&mut record);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for FallbackStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackStorage")
            .field("records", &self.records.len())
            .finish()
    }
}

impl SecretStorage for FallbackStorage {
    fn name(&self) -> &str {
        FALLBACK_BACKEND
    }

    fn store(&self, secret: &[u8]) -> Result<SecretId> {
        if secret.is_empty() {
            return Err(SecureDataError::Validation(
                "secret must not be empty".to_string(),
            ));
        }

        let record = Zeroizing::new(self.seal_record(secret)?);
        loop {
            let id = SecretId::new();
            if let Entry::Vacant(slot) = self.records.entry(id) {
                slot.insert(record);
                debug!(len = secret.len(), "stored secret in fallback backend");
                return Ok(id);
            }
        }
    }

    fn retrieve(&self, id: &SecretId) -> Option<Zeroizing<Vec<u8>>> {
        let record = self.records.get(id)?;
        self.open_record(&record)
    }

    fn remove(&self, id: &SecretId) {
        if let Some((_, mut record)) = self.records.remove(id) {
            record.zeroize();
            debug!("removed secret from fallback backend");
        }
    }
}
