//! ChaCha20-Poly1305 AEAD and hashing helpers.
//!
//! Containers call [`seal`] and [`open`], which keep the 12-byte nonce in
//! front of the ciphertext so a payload is a single self-describing blob:
//! `nonce || ciphertext || tag`. The lower-level [`encrypt`] and [`decrypt`]
//! take an explicit nonce.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{Result, SecureDataError};

/// AEAD key length in bytes.
pub const KEY_SIZE: usize = 32;
/// AEAD nonce length in bytes.
pub const NONCE_SIZE: usize = 12;
/// Poly1305 tag length in bytes.
pub const TAG_SIZE: usize = 16;

fn cipher(key: &[u8]) -> Result<ChaCha20Poly1305> {
    ChaCha20Poly1305::new_from_slice(key).map_err(|_| {
        SecureDataError::Validation(format!(
            "AEAD key must be {KEY_SIZE} bytes, got {}",
            key.len()
        ))
    })
}

fn check_nonce(nonce: &[u8]) -> Result<()> {
    if nonce.len() != NONCE_SIZE {
        return Err(SecureDataError::Validation(format!(
            "AEAD nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    Ok(())
}

/// Encrypt `plaintext` under `(key, nonce, aad)`, returning `ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8], nonce: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    check_nonce(nonce)?;
    cipher(key)?
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| SecureDataError::EncryptionFailed(e.to_string()))
}

/// Decrypt `ciphertext || tag` produced by [`encrypt`].
///
/// Any tag mismatch (wrong key, nonce, AAD, or modified bytes) yields
/// [`SecureDataError::AuthenticationFailed`] and no plaintext.
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    check_nonce(nonce)?;
    cipher(key)?
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| SecureDataError::AuthenticationFailed)
}

/// Encrypt under a fresh random nonce and prepend it to the output.
pub fn seal(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let nonce = generate_nonce();
    let ciphertext = encrypt(plaintext, key, &nonce, aad)?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Open a blob produced by [`seal`].
pub fn open(sealed: &[u8], key: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(SecureDataError::AuthenticationFailed);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    decrypt(ciphertext, key, nonce, aad)
}

/// Generate a random 96-bit nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Fill a fresh zeroize-on-drop buffer with `len` random bytes.
pub fn random_bytes(len: usize) -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// SHA-256 over the concatenation of `parts`.
pub fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compare two buffers. Lengths are compared first; equal-length contents are
/// compared in constant time.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
