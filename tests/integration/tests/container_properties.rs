//! Secure container behavior across the key manager and storage layers.

use std::sync::Arc;
use std::thread;

use memvault_integration_tests::{fallback_storage, DamageableStorage};
use memvault_secrets::{
    BytesCodec, SecretStorage, SecureBytes, SecureData, SecureDataError, SecureKey,
};

type Bytes = SecureData<Vec<u8>, BytesCodec>;

#[test]
fn test_round_trip_through_fallback() {
    let storage = fallback_storage();
    let mut data: Bytes = SecureData::with_storage(storage.clone(), BytesCodec, b"svc").unwrap();

    let values: [&[u8]; 4] = [b"", b"x", b"a longer secret value with spaces", &[0u8; 300]];
    for value in values {
        data.set_bytes(value).unwrap();
        assert_eq!(data.get_bytes().unwrap().as_slice(), value);
    }
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_store_empty_allocates_nothing() {
    let storage = fallback_storage();
    assert!(matches!(
        storage.store(&[]),
        Err(SecureDataError::Validation(_))
    ));
    assert!(storage.is_empty());
}

#[test]
fn test_damaged_key_fails_closed() {
    let storage = DamageableStorage::new();
    let mut data: Bytes = SecureData::with_storage(storage.clone(), BytesCodec, b"").unwrap();
    data.set_bytes(b"secret").unwrap();

    // Same-size but wrong key bytes: the AEAD tag no longer verifies.
    storage.flip_bits();
    assert!(matches!(
        data.get_bytes(),
        Err(SecureDataError::AuthenticationFailed)
    ));
}

#[test]
fn test_wrong_size_key_is_invalid_state() {
    let storage = DamageableStorage::new();
    let key = SecureKey::new(storage.clone()).unwrap();

    storage.truncate();
    assert!(matches!(key.key(), Err(SecureDataError::InvalidState(_))));
}

#[test]
fn test_lost_key_is_invalid_state() {
    let storage = DamageableStorage::new();
    let mut data: Bytes = SecureData::with_storage(storage.clone(), BytesCodec, b"").unwrap();
    data.set_bytes(b"secret").unwrap();

    storage.clear();
    assert!(matches!(
        data.get_bytes(),
        Err(SecureDataError::InvalidState(_))
    ));
    assert!(matches!(
        data.set_bytes(b"again"),
        Err(SecureDataError::InvalidState(_))
    ));
}

#[test]
fn test_dispose_removes_backing_secret() {
    let storage = DamageableStorage::new();
    let mut data: Bytes = SecureData::with_storage(storage.clone(), BytesCodec, b"").unwrap();
    data.set_bytes(b"secret").unwrap();
    assert_eq!(storage.len(), 1);

    data.dispose();
    assert!(storage.is_empty());
    assert_eq!(data.encrypted_len(), 0);
    assert!(matches!(data.get_bytes(), Err(SecureDataError::Disposed(_))));
    assert!(matches!(
        data.set_bytes(b"x"),
        Err(SecureDataError::Disposed(_))
    ));
}

#[test]
fn test_key_size_zero_uses_default() {
    let storage = DamageableStorage::new();
    let key = SecureKey::with_size(storage, 0).unwrap();
    assert_eq!(key.size(), 32);
    assert_eq!(key.key().unwrap().len(), 32);
}

#[test]
fn test_append_law() {
    let storage = fallback_storage();
    let mut bytes = SecureBytes::with_storage(storage, b"").unwrap();
    bytes.set(b"original").unwrap();

    bytes.append(b"+x").unwrap();
    assert_eq!(bytes.get().unwrap().as_slice(), b"original+x");
    assert_eq!(bytes.len(), 10);
}

#[test]
fn test_equality_under_independent_keys() {
    let storage = fallback_storage();
    let make = |value: &[u8]| {
        let mut bytes = SecureBytes::with_storage(storage.clone(), b"").unwrap();
        bytes.set(value).unwrap();
        bytes
    };

    let a = make(&[1, 2, 3, 4]);
    assert!(a.equals(&make(&[1, 2, 3, 4])).unwrap());
    assert!(!a.equals(&make(&[1, 2, 3, 5])).unwrap());
    assert!(!a.equals(&make(&[1, 2, 3])).unwrap());
}

#[test]
fn test_independent_containers_across_threads() {
    let storage = fallback_storage();

    let handles: Vec<_> = (0..8u8)
        .map(|n| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                for i in 0..25u8 {
                    let mut bytes = SecureBytes::with_storage(storage.clone(), &[n]).unwrap();
                    bytes.set(&[n, i]).unwrap();
                    bytes.append(&[0xEE]).unwrap();
                    assert_eq!(bytes.get().unwrap().as_slice(), &[n, i, 0xEE]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    // Every container was dropped, so every key was removed.
    assert!(storage.is_empty());
}

#[test]
fn test_process_wide_backend() {
    let mut bytes = SecureBytes::from_slice(b"global").unwrap();
    assert_eq!(bytes.get().unwrap().as_slice(), b"global");

    let mut input = b"wipe me".to_vec();
    let other = SecureBytes::from_slice_and_destroy(&mut input).unwrap();
    assert!(input.iter().all(|&b| b == 0));
    assert_eq!(other.get().unwrap().as_slice(), b"wipe me");

    bytes.dispose();
    assert!(bytes.is_disposed());
}
