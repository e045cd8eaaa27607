//! Conversion between typed values and container plaintext.

use zeroize::{Zeroize, Zeroizing};

use crate::error::Result;

/// How a [`SecureData`](crate::SecureData) turns its value type into bytes and back.
///
/// `serialize` must leave `value` untouched. `deserialize` must copy out of
/// `bytes`, which the container zeroizes as soon as it returns. `destroy`
/// scrubs a value the caller asked to have destroyed.
pub trait Codec<T> {
    fn serialize(&self, value: &T) -> Result<Zeroizing<Vec<u8>>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<T>;

    fn destroy(&self, value: &mut T);
}

/// Identity codec for raw byte buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn serialize(&self, value: &Vec<u8>) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(value.clone()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn destroy(&self, value: &mut Vec<u8>) {
        value.zeroize();
    }
}
