//! Encrypted in-memory containers for keys, passwords, and tokens.
//!
//! Values are held as ChaCha20-Poly1305 ciphertext. Each container owns a
//! per-instance key that lives in a [`SecretStorage`] backend (the OS keychain
//! when available, otherwise an encrypted in-process store) and is fetched
//! only for the duration of a single encrypt or decrypt.
//!
//! ```no_run
//! use memvault_secrets::{SecureString, TextEncoding};
//!
//! # fn main() -> memvault_secrets::Result<()> {
//! let password: SecureString = "correct horse battery staple".parse()?;
//! let words = password.split(&[' '])?;
//! assert_eq!(words.len(), 4);
//! assert_eq!(password.encoding(), TextEncoding::Utf8);
//! # Ok(())
//! # }
//! ```

pub mod bytes;
pub mod codec;
pub mod container;
pub mod crypto;
pub mod error;
pub mod key;
pub mod storage;
pub mod text;

pub use bytes::SecureBytes;
pub use codec::{BytesCodec, Codec};
pub use container::SecureData;
pub use error::{Result, SecureDataError};
pub use key::SecureKey;
pub use storage::{
    FallbackKeys, FallbackStorage, PlatformSecureStorage, SecretId, SecretStorage, StorageRegistry,
};
pub use text::{CharCodec, SecureChar, SecureString, TextCodec, TextEncoding};
