use crate::b64;
use crate::compare::strings_differ;
use crate::credentials::Key;
use crate::crypto;
use crate::error::*;
use crate::header::AuthParams;
use crate::normalize::normalized_request_string;
use crate::request::RequestFields;
use crate::DigestAlgorithm;
use base64::Engine;
use log::trace;
use std::fmt;
use std::ops::Deref;

/// A base64-encoded Hawk MAC.
///
/// Equality is checked in constant time, so two `Signature`s may safely be compared with `==`.
#[derive(Clone, Debug)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Signature {
    fn from(s: String) -> Self {
        Signature(s)
    }
}

impl From<&str> for Signature {
    fn from(s: &str) -> Self {
        Signature(s.to_string())
    }
}

impl Deref for Signature {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Signature) -> bool {
        !strings_differ(&self.0, &other.0)
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        !strings_differ(&self.0, other)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign a canonical string with a key, producing the base64-encoded HMAC.
///
/// The canonical string must be ASCII, as Hawk ids, nonces, and ext values are.
pub fn sign_with_key(canonical: &str, key: &Key) -> Result<Signature> {
    if !canonical.is_ascii() {
        return Err(Error::NonAscii("normalized request string"));
    }
    trace!("signing normalized string {:?}", canonical);
    let mac = key.sign(canonical.as_bytes())?;
    Ok(Signature(b64::STANDARD_ENGINE.encode(mac)))
}

/// Sign a canonical string with a textual key and a named digest algorithm.
pub fn sign(canonical: &str, key: &str, algorithm: &str) -> Result<Signature> {
    let algorithm: DigestAlgorithm = algorithm.parse()?;
    sign_with_key(canonical, &Key::from_ascii(key, algorithm)?)
}

/// Hash a normalized payload string, producing the value of the Hawk `hash` parameter.
pub fn hash_payload_string(payload: &str, algorithm: DigestAlgorithm) -> Result<String> {
    let mut hasher = crypto::get_cryptographer().new_hasher(algorithm)?;
    hasher.update(payload.as_bytes())?;
    Ok(b64::STANDARD_ENGINE.encode(hasher.finish()?))
}

/// Compute the MAC of a request under the given parameters.  The algorithm defaults to
/// `sha256`.
pub fn compute_signature(
    fields: &RequestFields,
    params: &AuthParams,
    key: &str,
    algorithm: Option<&str>,
) -> Result<Signature> {
    let algorithm = match algorithm {
        Some(name) => name.parse()?,
        None => DigestAlgorithm::default(),
    };
    let canonical = normalized_request_string(fields, Some(params), None)?;
    sign_with_key(&canonical, &Key::from_ascii(key, algorithm)?)
}
