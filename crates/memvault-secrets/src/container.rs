//! Generic encrypted value container.
//!
//! A [`SecureData`] owns exactly one [`SecureKey`] and keeps its value only as
//! a ChaCha20-Poly1305 payload. Every read or write fetches the key, runs one
//! AEAD operation, and drops (zeroizes) the key and any intermediate plaintext
//! before returning.
//!
//! The AEAD associated data is `SHA-256(key id || caller context)`, fixed at
//! construction, so a payload only opens under the container it was written by.
//!
//! Mutating operations take `&mut self`; share a container across threads
//! behind a lock.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use crate::codec::Codec;
use crate::crypto;
use crate::error::{Result, SecureDataError};
use crate::key::SecureKey;
use crate::storage::{PlatformSecureStorage, SecretStorage};

/// Encrypted holder for one value of type `T`, converted by codec `C`.
pub struct SecureData<T, C: Codec<T>> {
    key: SecureKey,
    context: Vec<u8>,
    aad: [u8; 32],
    payload: Vec<u8>,
    codec: C,
    disposed: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T, C: Codec<T>> SecureData<T, C> {
    /// Empty container keyed in the process-wide backend, with no extra context.
    pub fn new(codec: C) -> Result<Self> {
        Self::with_storage(PlatformSecureStorage::global(), codec, &[])
    }

    /// Empty container keyed in the process-wide backend, bound to `context`.
    pub fn with_context(codec: C, context: &[u8]) -> Result<Self> {
        Self::with_storage(PlatformSecureStorage::global(), codec, context)
    }

    /// Empty container keyed in `storage`, bound to `context`.
    pub fn with_storage(storage: Arc<dyn SecretStorage>, codec: C, context: &[u8]) -> Result<Self> {
        let key = SecureKey::new(storage)?;
        let aad = crypto::sha256(&[&key.id()?, context]);

        Ok(Self {
            key,
            context: context.to_vec(),
            aad,
            payload: Vec::new(),
            codec,
            disposed: false,
            _value: PhantomData,
        })
    }

    /// Replace the stored value with `bytes`.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_live()?;
        let key = self.key.key()?;
        self.payload = crypto::seal(bytes, &key, &self.aad)?;
        Ok(())
    }

    /// Like [`set_bytes`](Self::set_bytes), then zeroize `bytes`.
    pub fn set_bytes_and_destroy(&mut self, bytes: &mut [u8]) -> Result<()> {
        let result = self.set_bytes(bytes);
        bytes.zeroize();
        result
    }

    /// Replace the stored value with the serialized `value`.
    pub fn set_data(&mut self, value: &T) -> Result<()> {
        self.ensure_live()?;
        let bytes = self.codec.serialize(value)?;
        self.set_bytes(&bytes)
    }

    /// Like [`set_data`](Self::set_data), then scrub `value` through the codec.
    pub fn set_data_and_destroy(&mut self, value: &mut T) -> Result<()> {
        let result = self.set_data(value);
        self.codec.destroy(value);
        result
    }

    /// Append `bytes` to the stored value and re-encrypt under a fresh nonce.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_live()?;
        let key = self.key.key()?;

        let current = self.open_payload(&key)?;
        let mut combined = Zeroizing::new(Vec::with_capacity(current.len() + bytes.len()));
        combined.extend_from_slice(&current);
        drop(current);
        combined.extend_from_slice(bytes);

        self.payload = crypto::seal(&combined, &key, &self.aad)?;
        Ok(())
    }

    /// Like [`append_bytes`](Self::append_bytes), then zeroize `bytes`.
    pub fn append_bytes_and_destroy(&mut self, bytes: &mut [u8]) -> Result<()> {
        let result = self.append_bytes(bytes);
        bytes.zeroize();
        result
    }

    /// Append the serialized `value` to the stored value.
    pub fn append_data(&mut self, value: &T) -> Result<()> {
        self.ensure_live()?;
        let bytes = self.codec.serialize(value)?;
        self.append_bytes(&bytes)
    }

    /// Like [`append_data`](Self::append_data), then scrub `value` through the codec.
    pub fn append_data_and_destroy(&mut self, value: &mut T) -> Result<()> {
        let result = self.append_data(value);
        self.codec.destroy(value);
        result
    }

    /// Decrypt a fresh copy of the stored bytes.
    pub fn get_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_live()?;
        let key = self.key.key()?;
        self.open_payload(&key)
    }

    /// Decrypt and deserialize the stored value.
    pub fn get_data(&self) -> Result<T> {
        let bytes = self.get_bytes()?;
        self.codec.deserialize(&bytes)
    }

    /// Compare the decrypted contents of two containers.
    ///
    /// Lengths are compared first and may leak through timing; equal-length
    /// contents are compared in constant time.
    pub fn equals(&self, other: &Self) -> Result<bool> {
        let mine = self.get_bytes()?;
        let theirs = other.get_bytes()?;
        Ok(crypto::constant_time_eq(&mine, &theirs))
    }

    /// Remove the key from its backend and clear the payload. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.key.dispose();
        self.payload.zeroize();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Caller-supplied context bound into the associated data.
    pub fn context(&self) -> &[u8] {
        &self.context
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Name of the backend holding this container's key.
    pub fn backend(&self) -> &str {
        self.key.backend()
    }

    /// The backend holding this container's key; new containers derived from
    /// this one are keyed in the same backend.
    pub fn storage(&self) -> Arc<dyn SecretStorage> {
        self.key.storage()
    }

    /// Length of the stored payload (nonce, ciphertext and tag); 0 before the first write.
    pub fn encrypted_len(&self) -> usize {
        self.payload.len()
    }

    fn open_payload(&self, key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if self.payload.is_empty() {
            return Ok(Zeroizing::new(Vec::new()));
        }
        crypto::open(&self.payload, key, &self.aad)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(SecureDataError::Disposed("SecureData"));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn key(&self) -> &SecureKey {
        &self.key
    }

    #[cfg(test)]
    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[cfg(test)]
    pub(crate) fn aad(&self) -> &[u8; 32] {
        &self.aad
    }
}

impl<T, C: Codec<T>> Drop for SecureData<T, C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, C: Codec<T>> fmt::Debug for SecureData<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureData")
            .field("backend", &self.key.backend())
            .field("encrypted_len", &self.payload.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}
