//! `hawkauth` must perform certain cryptographic operations in order to function,
//! and applications may need control over which library is used for these.
//!
//! This module can be used for that purpose. If you do not care, the `use_ring`
//! feature (on by default) installs a backend built on `ring` the first time one
//! is needed. `use_openssl` provides a second implementation, which must then be
//! installed explicitly with [`set_cryptographer`].
use crate::DigestAlgorithm;
use failure::Fail;

pub(crate) mod holder;
pub(crate) use holder::get_cryptographer;

#[cfg(feature = "use_ring")]
mod ring;

#[cfg(feature = "use_openssl")]
mod openssl;

#[cfg(feature = "use_ring")]
pub use self::ring::RingCryptographer;

#[cfg(feature = "use_openssl")]
pub use self::openssl::OpensslCryptographer;

pub use holder::{set_boxed_cryptographer, set_cryptographer, SetCryptographerError};

#[derive(Debug, Fail)]
pub enum CryptoError {
    /// The configured cryptographer does not support the digest algorithm
    /// specified.
    #[fail(display = "Digest algorithm {:?} is unsupported by this Cryptographer", _0)]
    UnsupportedDigest(DigestAlgorithm),

    /// The configured cryptographer implementation failed to perform an
    /// operation in some way.
    #[fail(display = "{}", _0)]
    Other(#[fail(cause)] failure::Error),
}

/// A trait encapsulating the cryptographic operations required by this library.
///
/// If you use this library with the `use_ring` feature disabled, you must
/// provide an implementation of this trait and install it with
/// [`set_cryptographer`] before signing or hashing anything.
pub trait Cryptographer: Send + Sync + 'static {
    fn rand_bytes(&self, output: &mut [u8]) -> Result<(), CryptoError>;
    fn new_key(
        &self,
        algorithm: DigestAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn HmacKey>, CryptoError>;
    fn new_hasher(&self, algo: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError>;
}

/// Type-erased hmac key type.
pub trait HmacKey: Send + Sync + 'static {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Type-erased hash context type.
pub trait Hasher: Send + Sync + 'static {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;
    // Note: this would take by value but that's not object safe :(
    fn finish(&mut self) -> Result<Vec<u8>, CryptoError>;
}
