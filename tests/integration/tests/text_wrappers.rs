//! String and character wrappers.

use memvault_integration_tests::fallback_storage;
use memvault_secrets::{SecureBytes, SecureChar, SecureString, TextEncoding};

#[test]
fn test_hello_split_on_l() {
    let storage = fallback_storage();
    let mut hello = SecureString::with_storage(storage.clone(), TextEncoding::Utf8, b"").unwrap();
    hello.set_str("hello").unwrap();

    let parts = hello.split(&['l']).unwrap();
    let values: Vec<String> = parts
        .iter()
        .map(|part| part.expose().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["he", "", "o"]);

    // One key for the source plus one per part.
    assert_eq!(storage.len(), 4);
    drop(parts);
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_parse_uses_process_wide_backend() {
    let text: SecureString = "token-123".parse().unwrap();
    assert_eq!(text.len(), 9);
    assert_eq!(text.index_of_str("123").unwrap(), Some(6));
    assert_eq!(text.substring(0, Some(5)).unwrap().expose().unwrap().as_str(), "token");
}

#[test]
fn test_from_chars_and_destroy() {
    let mut chars = ['p', 'í', 'n'];
    let text = SecureString::from_chars_and_destroy(&mut chars).unwrap();
    assert_eq!(chars, ['\0'; 3]);
    assert_eq!(text.expose().unwrap().as_str(), "pín");
    assert_eq!(text.len(), 3);
}

#[test]
fn test_encoded_round_trip() {
    let encoded = TextEncoding::Utf16Be.encode("naïve");
    let text = SecureString::from_encoded(&encoded, TextEncoding::Utf16Be).unwrap();
    assert_eq!(text.encoding(), TextEncoding::Utf16Be);
    assert_eq!(text.len(), 5);
    assert_eq!(text.to_chars().unwrap().as_slice(), &['n', 'a', 'ï', 'v', 'e']);

    assert!(SecureString::from_encoded(&[0x00], TextEncoding::Utf16Be).is_err());
}

#[test]
fn test_bytes_to_string() {
    let storage = fallback_storage();
    let mut bytes = SecureBytes::with_storage(storage, b"ctx").unwrap();
    bytes.set("pässword".as_bytes()).unwrap();

    let text = SecureString::from_secure_bytes(&bytes, TextEncoding::Utf8).unwrap();
    assert_eq!(text.len(), 8);
    assert_eq!(text.context(), b"ctx");
    assert_eq!(text.expose().unwrap().as_str(), "pässword");
}

#[test]
fn test_secure_char() {
    let c = SecureChar::from_char('€').unwrap();
    assert_eq!(c.get().unwrap(), '€');

    let encoded = TextEncoding::Utf16Le.encode("€");
    let d = SecureChar::from_encoded(&encoded, TextEncoding::Utf16Le).unwrap();
    assert!(c.equals(&d).unwrap());

    assert!(SecureChar::from_encoded(b"ab", TextEncoding::Utf8).is_err());
}
