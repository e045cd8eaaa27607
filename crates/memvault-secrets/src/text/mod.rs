//! Encrypted text: strings and single characters.
//!
//! Text is held as encoded bytes in a [`SecureData`](crate::SecureData)
//! payload. Lengths and indices count Unicode scalar values (`char`), not bytes.

mod character;
mod string;

pub use character::{CharCodec, SecureChar};
pub use string::{SecureString, TextCodec};

use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, SecureDataError};

/// Byte encoding of text payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Encode a string.
    pub fn encode(&self, text: &str) -> Zeroizing<Vec<u8>> {
        match self {
            Self::Utf8 => Zeroizing::new(text.as_bytes().to_vec()),
            Self::Utf16Le | Self::Utf16Be => {
                let mut out = Zeroizing::new(Vec::with_capacity(text.len() * 2));
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&self.unit_bytes(unit));
                }
                out
            }
        }
    }

    /// Encode a sequence of characters.
    pub fn encode_chars(&self, chars: &[char]) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(chars.len() * 4));
        let mut utf8 = [0u8; 4];
        let mut utf16 = [0u16; 2];
        for &c in chars {
            match self {
                Self::Utf8 => out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes()),
                Self::Utf16Le | Self::Utf16Be => {
                    for &unit in c.encode_utf16(&mut utf16).iter() {
                        out.extend_from_slice(&self.unit_bytes(unit));
                    }
                }
            }
        }
        utf8.zeroize();
        utf16.zeroize();
        out
    }

    /// Decode `bytes` into characters. Invalid input is a validation error.
    ///
    /// The buffer is sized up front and never grows, so no unwiped copy of
    /// the decoded text is left behind by a reallocation.
    pub fn decode_chars(&self, bytes: &[u8]) -> Result<Zeroizing<Vec<char>>> {
        let mut chars = Zeroizing::new(Vec::with_capacity(bytes.len()));
        match self {
            Self::Utf8 => {
                let text = std::str::from_utf8(bytes).map_err(|_| self.invalid())?;
                for c in text.chars() {
                    chars.push(c);
                }
            }
            Self::Utf16Le | Self::Utf16Be => {
                for c in char::decode_utf16(self.units(bytes)?) {
                    chars.push(c.map_err(|_| self.invalid())?);
                }
            }
        }
        Ok(chars)
    }

    /// Decode `bytes` into a string.
    pub fn decode(&self, bytes: &[u8]) -> Result<Zeroizing<String>> {
        match self {
            Self::Utf8 => {
                let text = std::str::from_utf8(bytes).map_err(|_| self.invalid())?;
                Ok(Zeroizing::new(text.to_owned()))
            }
            Self::Utf16Le | Self::Utf16Be => {
                // A UTF-16 unit never takes more than three UTF-8 bytes.
                let mut text = Zeroizing::new(String::with_capacity(bytes.len() / 2 * 3));
                for c in char::decode_utf16(self.units(bytes)?) {
                    text.push(c.map_err(|_| self.invalid())?);
                }
                Ok(text)
            }
        }
    }

    /// Number of characters `bytes` decodes to.
    pub fn char_count(&self, bytes: &[u8]) -> Result<usize> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(|text| text.chars().count())
                .map_err(|_| self.invalid()),
            Self::Utf16Le | Self::Utf16Be => {
                let mut count = 0;
                for c in char::decode_utf16(self.units(bytes)?) {
                    c.map_err(|_| self.invalid())?;
                    count += 1;
                }
                Ok(count)
            }
        }
    }

    fn unit_bytes(&self, unit: u16) -> [u8; 2] {
        match self {
            Self::Utf16Be => unit.to_be_bytes(),
            _ => unit.to_le_bytes(),
        }
    }

    fn units<'a>(&self, bytes: &'a [u8]) -> Result<impl Iterator<Item = u16> + 'a> {
        if bytes.len() % 2 != 0 {
            return Err(SecureDataError::Validation(format!(
                "{} input has an odd number of bytes",
                self.as_str()
            )));
        }
        let big_endian = *self == Self::Utf16Be;
        Ok(bytes.chunks_exact(2).map(move |pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        }))
    }

    fn invalid(&self) -> SecureDataError {
        SecureDataError::Validation(format!("input is not valid {}", self.as_str()))
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Utf16Le,
        TextEncoding::Utf16Be,
    ];

    #[test]
    fn test_encodings_agree_on_text() {
        for encoding in ALL {
            let bytes = encoding.encode("héllo 🔑");
            assert_eq!(encoding.decode(&bytes).unwrap().as_str(), "héllo 🔑");
            assert_eq!(encoding.char_count(&bytes).unwrap(), 7);

            let chars: Vec<char> = "héllo 🔑".chars().collect();
            assert_eq!(encoding.encode_chars(&chars), bytes);
            assert_eq!(encoding.decode_chars(&bytes).unwrap().as_slice(), chars.as_slice());
        }
    }

    #[test]
    fn test_utf16_byte_order() {
        assert_eq!(TextEncoding::Utf16Le.encode("A").as_slice(), &[0x41, 0x00]);
        assert_eq!(TextEncoding::Utf16Be.encode("A").as_slice(), &[0x00, 0x41]);
    }

    #[test]
    fn test_surrogate_pairs_count_as_one_char() {
        let bytes = TextEncoding::Utf16Le.encode("🔑");
        assert_eq!(bytes.len(), 4);
        assert_eq!(TextEncoding::Utf16Le.char_count(&bytes).unwrap(), 1);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(matches!(
            TextEncoding::Utf8.decode(&[0xFF, 0xFE]),
            Err(SecureDataError::Validation(_))
        ));
        assert!(matches!(
            TextEncoding::Utf16Le.decode(&[0x41]),
            Err(SecureDataError::Validation(_))
        ));
        // Lone high surrogate.
        assert!(matches!(
            TextEncoding::Utf16Le.decode_chars(&[0x3D, 0xD8]),
            Err(SecureDataError::Validation(_))
        ));
        assert!(TextEncoding::Utf16Be.char_count(&[0xD8, 0x3D]).is_err());
    }

    #[test]
    fn test_decode_buffers_never_grow() {
        let text = format!("🔑{}é", "a".repeat(100));
        for encoding in ALL {
            let bytes = encoding.encode(&text);

            let chars = encoding.decode_chars(&bytes).unwrap();
            assert_eq!(chars.len(), 102);
            assert_eq!(chars.capacity(), bytes.len());

            let decoded = encoding.decode(&bytes).unwrap();
            assert_eq!(decoded.as_str(), text);
            assert!(decoded.capacity() >= decoded.len());
        }

        // Worst case for UTF-16: every unit widens to three UTF-8 bytes.
        let wide = "€".repeat(40);
        let bytes = TextEncoding::Utf16Le.encode(&wide);
        let decoded = TextEncoding::Utf16Le.decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 120);
        assert_eq!(decoded.capacity(), bytes.len() / 2 * 3);
    }

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(TextEncoding::default(), TextEncoding::Utf8);
        assert_eq!(TextEncoding::Utf16Be.to_string(), "utf-16be");
    }
}
