use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use super::TextEncoding;
use crate::bytes::SecureBytes;
use crate::codec::Codec;
use crate::container::SecureData;
use crate::crypto;
use crate::error::{Result, SecureDataError};
use crate::storage::{PlatformSecureStorage, SecretStorage};

/// Codec for character sequences in a fixed [`TextEncoding`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCodec {
    encoding: TextEncoding,
}

impl TextCodec {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl Codec<Vec<char>> for TextCodec {
    fn serialize(&self, value: &Vec<char>) -> Result<Zeroizing<Vec<u8>>> {
        Ok(self.encoding.encode_chars(value))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<char>> {
        let mut chars = self.encoding.decode_chars(bytes)?;
        Ok(std::mem::take(&mut *chars))
    }

    fn destroy(&self, value: &mut Vec<char>) {
        value.zeroize();
    }
}

/// A string kept encrypted in memory.
///
/// Every query decrypts the whole string once, works on a zeroize-on-drop
/// character buffer, and builds any results from sub-ranges of that buffer.
pub struct SecureString {
    inner: SecureData<Vec<char>, TextCodec>,
    len: usize,
}

impl SecureString {
    /// Empty UTF-8 string keyed in the process-wide backend, bound to `context`.
    pub fn new(context: &[u8]) -> Result<Self> {
        Self::with_encoding(TextEncoding::Utf8, context)
    }

    /// Empty string in `encoding`, keyed in the process-wide backend.
    pub fn with_encoding(encoding: TextEncoding, context: &[u8]) -> Result<Self> {
        Self::with_storage(PlatformSecureStorage::global(), encoding, context)
    }

    /// Empty string in `encoding`, keyed in `storage`.
    pub fn with_storage(
        storage: Arc<dyn SecretStorage>,
        encoding: TextEncoding,
        context: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            inner: SecureData::with_storage(storage, TextCodec::new(encoding), context)?,
            len: 0,
        })
    }

    /// Encrypt `chars` as UTF-8, then zeroize them.
    pub fn from_chars_and_destroy(chars: &mut [char]) -> Result<Self> {
        let result = Self::new(&[]).and_then(|mut secure| {
            secure.set_chars(chars)?;
            Ok(secure)
        });
        chars.zeroize();
        result
    }

    /// Take already-encoded text. Fails if `bytes` is not valid `encoding`.
    pub fn from_encoded(bytes: &[u8], encoding: TextEncoding) -> Result<Self> {
        let mut secure = Self::with_encoding(encoding, &[])?;
        secure.set_encoded(bytes)?;
        Ok(secure)
    }

    /// Reinterpret the contents of `bytes` as text in `encoding`.
    pub fn from_secure_bytes(bytes: &SecureBytes, encoding: TextEncoding) -> Result<Self> {
        let mut secure = Self::with_storage(bytes.storage(), encoding, bytes.context())?;
        secure.set_encoded(&bytes.get()?)?;
        Ok(secure)
    }

    /// Independent copy of `other` under a fresh key.
    pub fn from_secure(other: &SecureString) -> Result<Self> {
        other.child(&other.to_chars()?)
    }

    /// Replace the contents with `text`.
    pub fn set_str(&mut self, text: &str) -> Result<()> {
        let bytes = self.encoding().encode(text);
        self.inner.set_bytes(&bytes)?;
        self.len = text.chars().count();
        Ok(())
    }

    /// Append `text`.
    pub fn append_str(&mut self, text: &str) -> Result<()> {
        let bytes = self.encoding().encode(text);
        self.inner.append_bytes(&bytes)?;
        self.len += text.chars().count();
        Ok(())
    }

    /// Append the contents of another string, re-encoding if the encodings differ.
    pub fn append_secure(&mut self, other: &SecureString) -> Result<()> {
        let chars = other.to_chars()?;
        let bytes = self.encoding().encode_chars(&chars);
        self.inner.append_bytes(&bytes)?;
        self.len += chars.len();
        Ok(())
    }

    /// `length` characters starting at character `start`; `None` takes the rest.
    pub fn substring(&self, start: usize, length: Option<usize>) -> Result<SecureString> {
        let chars = self.to_chars()?;
        let end = match length {
            Some(length) => start.checked_add(length),
            None => Some(chars.len()),
        };
        match end {
            Some(end) if start <= end && end <= chars.len() => self.child(&chars[start..end]),
            _ => Err(SecureDataError::Validation(format!(
                "substring out of range for string of length {}",
                chars.len()
            ))),
        }
    }

    /// Index of the first occurrence of `needle`.
    pub fn index_of_char(&self, needle: char) -> Result<Option<usize>> {
        let chars = self.to_chars()?;
        Ok(chars.iter().position(|&c| c == needle))
    }

    /// Index of the first occurrence of `needle`. An empty needle matches at 0.
    pub fn index_of_str(&self, needle: &str) -> Result<Option<usize>> {
        // One char per UTF-8 byte at most, so the buffer never grows.
        let mut pattern = Zeroizing::new(Vec::with_capacity(needle.len()));
        pattern.extend(needle.chars());
        if pattern.is_empty() {
            return Ok(Some(0));
        }

        let chars = self.to_chars()?;
        if pattern.len() > chars.len() {
            return Ok(None);
        }
        Ok(chars
            .windows(pattern.len())
            .position(|window| window == pattern.as_slice()))
    }

    /// Split on any of `delimiters`. Adjacent delimiters produce empty parts.
    pub fn split(&self, delimiters: &[char]) -> Result<Vec<SecureString>> {
        let chars = self.to_chars()?;
        chars
            .split(|c| delimiters.contains(c))
            .map(|part| self.child(part))
            .collect()
    }

    /// Decrypt the contents as a `String`.
    pub fn expose(&self) -> Result<Zeroizing<String>> {
        let bytes = self.inner.get_bytes()?;
        self.encoding().decode(&bytes)
    }

    /// Decrypt the contents as characters.
    pub fn to_chars(&self) -> Result<Zeroizing<Vec<char>>> {
        Ok(Zeroizing::new(self.inner.get_data()?))
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn encoding(&self) -> TextEncoding {
        self.inner.codec().encoding()
    }

    pub fn context(&self) -> &[u8] {
        self.inner.context()
    }

    /// Compare as text. Strings in different encodings compare equal when
    /// their characters match.
    pub fn equals(&self, other: &SecureString) -> Result<bool> {
        if self.encoding() == other.encoding() {
            return self.inner.equals(&other.inner);
        }

        let mine = self.inner.get_bytes()?;
        let theirs = self.encoding().encode_chars(&other.to_chars()?);
        Ok(crypto::constant_time_eq(&mine, &theirs))
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
        self.len = 0;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn set_chars(&mut self, chars: &[char]) -> Result<()> {
        let bytes = self.encoding().encode_chars(chars);
        self.inner.set_bytes(&bytes)?;
        self.len = chars.len();
        Ok(())
    }

    fn set_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        let len = self.encoding().char_count(bytes)?;
        self.inner.set_bytes(bytes)?;
        self.len = len;
        Ok(())
    }

    /// New string holding `chars`, in this string's backend, encoding and context.
    fn child(&self, chars: &[char]) -> Result<SecureString> {
        let mut child = SecureString::with_storage(
            self.inner.storage(),
            self.encoding(),
            self.inner.context(),
        )?;
        child.set_chars(chars)?;
        Ok(child)
    }
}

impl FromStr for SecureString {
    type Err = SecureDataError;

    /// Encrypt `text` as UTF-8 in the process-wide backend.
    fn from_str(text: &str) -> Result<Self> {
        let mut secure = Self::new(&[])?;
        secure.set_str(text)?;
        Ok(secure)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.len)
            .field("encoding", &self.encoding())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}
