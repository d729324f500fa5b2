use crate::crypto::{self, HmacKey};
use crate::error::*;
use crate::DigestAlgorithm;
use std::fmt;

/// Hawk key.
///
/// While any sequence of bytes can be specified as a key, note that each digest algorithm has
/// a suggested key length, and that passwords should *not* be used as keys.  Keys of incorrect
/// length are handled according to the digest's implementation.
pub struct Key {
    key: Box<dyn HmacKey>,
    algorithm: DigestAlgorithm,
}

impl Key {
    pub fn new<B>(key: B, algorithm: DigestAlgorithm) -> Result<Key>
    where
        B: AsRef<[u8]>,
    {
        Ok(Key {
            key: crypto::get_cryptographer().new_key(algorithm, key.as_ref())?,
            algorithm,
        })
    }

    /// Create a key from text.  Hawk keys exchanged as text must be ASCII.
    pub fn from_ascii(key: &str, algorithm: DigestAlgorithm) -> Result<Key> {
        if !key.is_ascii() {
            return Err(Error::NonAscii("key"));
        }
        Key::new(key.as_bytes(), algorithm)
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key.sign(data)?)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Hawk credentials: an ID and a key associated with that ID.  The digest algorithm
/// must be agreed between the server and the client, and the length of the key is
/// specific to that algorithm.
#[derive(Debug)]
pub struct Credentials {
    pub id: String,
    pub key: Key,
}
