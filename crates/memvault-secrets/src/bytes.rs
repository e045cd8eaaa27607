//! Encrypted byte buffer.

use std::fmt;
use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use crate::codec::BytesCodec;
use crate::container::SecureData;
use crate::error::{Result, SecureDataError};
use crate::storage::{PlatformSecureStorage, SecretStorage};

/// A byte buffer kept encrypted in memory.
pub struct SecureBytes {
    inner: SecureData<Vec<u8>, BytesCodec>,
    len: usize,
}

impl SecureBytes {
    /// Empty buffer keyed in the process-wide backend.
    pub fn new() -> Result<Self> {
        Self::with_context(&[])
    }

    /// Empty buffer keyed in the process-wide backend, bound to `context`.
    pub fn with_context(context: &[u8]) -> Result<Self> {
        Self::with_storage(PlatformSecureStorage::global(), context)
    }

    /// Empty buffer keyed in `storage`, bound to `context`.
    pub fn with_storage(storage: Arc<dyn SecretStorage>, context: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: SecureData::with_storage(storage, BytesCodec, context)?,
            len: 0,
        })
    }

    /// Encrypt a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut secure = Self::new()?;
        secure.set(bytes)?;
        Ok(secure)
    }

    /// Encrypt `bytes`, then zeroize them.
    pub fn from_slice_and_destroy(bytes: &mut [u8]) -> Result<Self> {
        let result = Self::from_slice(bytes);
        bytes.zeroize();
        result
    }

    /// Independent copy of `other` under a fresh key in the same backend and context.
    pub fn from_secure(other: &SecureBytes) -> Result<Self> {
        let mut secure = Self::with_storage(other.storage(), other.context())?;
        secure.set(&other.get()?)?;
        Ok(secure)
    }

    pub fn set(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.set_bytes(bytes)?;
        self.len = bytes.len();
        Ok(())
    }

    pub fn set_and_destroy(&mut self, bytes: &mut [u8]) -> Result<()> {
        let result = self.set(bytes);
        bytes.zeroize();
        result
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.append_bytes(bytes)?;
        self.len += bytes.len();
        Ok(())
    }

    pub fn append_and_destroy(&mut self, bytes: &mut [u8]) -> Result<()> {
        let result = self.append(bytes);
        bytes.zeroize();
        result
    }

    /// Append the contents of another buffer.
    pub fn append_secure(&mut self, other: &SecureBytes) -> Result<()> {
        let bytes = other.get()?;
        self.append(&bytes)
    }

    /// Decrypt a copy of the contents.
    pub fn get(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.inner.get_bytes()
    }

    /// Plaintext length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Compare contents; see [`SecureData::equals`].
    pub fn equals(&self, other: &SecureBytes) -> Result<bool> {
        self.inner.equals(&other.inner)
    }

    /// Lowercase hex rendering of the contents, written into a buffer sized
    /// up front so no partial copy is freed unwiped.
    pub fn expose_hex(&self) -> Result<Zeroizing<String>> {
        let bytes = self.get()?;
        let mut out = Zeroizing::new(vec![0u8; bytes.len() * 2]);
        hex::encode_to_slice(bytes.as_slice(), &mut out)
            .map_err(|e| SecureDataError::Validation(format!("hex encoding failed: {e}")))?;

        let text = String::from_utf8(std::mem::take(&mut *out)).map_err(|e| {
            drop(Zeroizing::new(e.into_bytes()));
            SecureDataError::Validation("hex output is not ASCII".to_string())
        })?;
        Ok(Zeroizing::new(text))
    }

    pub fn context(&self) -> &[u8] {
        self.inner.context()
    }

    pub fn storage(&self) -> Arc<dyn SecretStorage> {
        self.inner.storage()
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
        self.len = 0;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.len)
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}
