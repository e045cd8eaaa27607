use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use super::TextEncoding;
use crate::codec::Codec;
use crate::container::SecureData;
use crate::error::{Result, SecureDataError};
use crate::storage::{PlatformSecureStorage, SecretStorage};

/// Codec for exactly one character in a fixed [`TextEncoding`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharCodec {
    encoding: TextEncoding,
}

impl CharCodec {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl Codec<char> for CharCodec {
    fn serialize(&self, value: &char) -> Result<Zeroizing<Vec<u8>>> {
        Ok(self.encoding.encode_chars(&[*value]))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<char> {
        match self.encoding.decode_chars(bytes)?.as_slice() {
            [c] => Ok(*c),
            chars => Err(SecureDataError::Validation(format!(
                "expected exactly one character, found {}",
                chars.len()
            ))),
        }
    }

    fn destroy(&self, value: &mut char) {
        *value = '\0';
    }
}

/// A single character kept encrypted in memory.
pub struct SecureChar {
    inner: SecureData<char, CharCodec>,
}

impl SecureChar {
    /// Unset UTF-8 character keyed in the process-wide backend, bound to `context`.
    pub fn new(context: &[u8]) -> Result<Self> {
        Self::with_storage(PlatformSecureStorage::global(), TextEncoding::Utf8, context)
    }

    /// Unset character in `encoding`, keyed in `storage`.
    pub fn with_storage(
        storage: Arc<dyn SecretStorage>,
        encoding: TextEncoding,
        context: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            inner: SecureData::with_storage(storage, CharCodec::new(encoding), context)?,
        })
    }

    /// Encrypt `value` as UTF-8.
    pub fn from_char(value: char) -> Result<Self> {
        let mut secure = Self::new(&[])?;
        secure.set(value)?;
        Ok(secure)
    }

    /// Take one already-encoded character.
    pub fn from_encoded(bytes: &[u8], encoding: TextEncoding) -> Result<Self> {
        let mut secure = Self::with_storage(PlatformSecureStorage::global(), encoding, &[])?;
        secure.set_encoded(bytes)?;
        Ok(secure)
    }

    pub fn set(&mut self, value: char) -> Result<()> {
        self.inner.set_data(&value)
    }

    /// Replace the value with one encoded character. Anything else is rejected.
    pub fn set_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.codec().deserialize(bytes)?;
        self.inner.set_bytes(bytes)
    }

    /// Decrypt the character. Fails with a validation error if none was set.
    pub fn get(&self) -> Result<char> {
        self.inner.get_data()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.inner.codec().encoding()
    }

    pub fn equals(&self, other: &SecureChar) -> Result<bool> {
        if self.encoding() == other.encoding() {
            return self.inner.equals(&other.inner);
        }
        Ok(self.get()? == other.get()?)
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl fmt::Debug for SecureChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureChar")
            .field("encoding", &self.encoding())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}
