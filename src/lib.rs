//! The `hawkauth` crate provides the core of the Hawk HTTP authentication scheme: parsing of
//! `Authorization` header parameters, construction of the normalized request and payload
//! strings, HMAC signatures over them, and constant-time comparison of the results.
//!
//! # Examples
//!
//! ## Hawk Client
//!
//! A client signs a request, here described directly by its `RequestFields`, and sends the
//! resulting header along with it.
//!
//! ```
//! use hawkauth::{sign_request, Credentials, Key, RequestFields, SignOptions, SHA256};
//!
//! let credentials = Credentials {
//!     id: "test-client".to_string(),
//!     key: Key::new("no-secret", SHA256).unwrap(),
//! };
//! let mut fields = RequestFields::new("GET", "http", "localhost:8000", "/resource");
//! let header = sign_request(&mut fields, &credentials, &SignOptions::default()).unwrap();
//! assert!(header.starts_with("Hawk id=\"test-client\""));
//! assert!(header.contains("mac="));
//! ```
//!
//! `http::Request` values can be signed in place with the `SignRequest` trait.
//!
//! ## Hawk Server
//!
//! A server looks up the key for the claimed id and then checks the signature.
//!
//! ```
//! use hawkauth::{check_signature, get_id, CheckOptions, Key, RequestFields, SHA256};
//!
//! let fields = RequestFields::new("GET", "http", "example.com:8000", "/resource/1?b=1&a=2")
//!     .authorization(
//!         "Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", \
//!          ext=\"some-app-ext-data\", mac=\"6R4rV5iE+NPoym+WwjeHzjAGXUtLNIxmo1vpMofpLAE=\"",
//!     );
//! assert_eq!(get_id(&fields, None).as_deref(), Some("dh37fgj492je"));
//!
//! let key = Key::new("werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn", SHA256).unwrap();
//! assert!(check_signature(&fields, &key, &CheckOptions::default()));
//! ```
//!
//! Note that `check_signature` does not track nonces or bound the timestamp; a server that
//! needs replay protection must do that itself.
//!
//! ## Lower levels
//!
//! The pieces are available individually:
//!
//! ```
//! use hawkauth::{normalized_request_string, sign, strings_differ, AuthParams, RequestFields};
//!
//! let params: AuthParams = "Hawk ts=\"1353832234\", nonce=\"j4h3g2\"".parse().unwrap();
//! let fields = RequestFields::new("GET", "http", "example.com", "/resource?a=1");
//! let canonical = normalized_request_string(&fields, Some(&params), None).unwrap();
//! assert_eq!(
//!     canonical,
//!     "hawk.1.header\n1353832234\nj4h3g2\nGET\n/resource?a=1\nexample.com\n80\n\n\n"
//! );
//! let mac = sign(&canonical, "secret", "sha256").unwrap();
//! assert!(!strings_differ(&mac, &sign(&canonical, "secret", "sha256").unwrap()));
//! ```

mod auth;
mod b64;
mod compare;
mod credentials;
pub mod crypto;
mod error;
mod header;
mod normalize;
mod request;
mod sign;

pub use crate::auth::{
    check_signature, get_id, get_signature, hash_payload, sign_request, verify_payload,
    CheckOptions, SignOptions, SignRequest, ValidateRequest,
};
pub use crate::compare::strings_differ;
pub use crate::credentials::{Credentials, Key};
pub use crate::error::*;
pub use crate::header::{parse_authz_header, parse_authz_header_or, AuthParams};
pub use crate::normalize::{
    host_and_port, normalized_payload_string, normalized_request_string, request_string,
    RequestString,
};
pub use crate::request::{RequestFields, RequestSource};
pub use crate::sign::{compute_signature, hash_payload_string, sign, sign_with_key, Signature};

use std::fmt;
use std::str::FromStr;

/// The digest algorithms a Hawk key may use.  Hawk itself does not fix this set; these are
/// the algorithms Hawk implementations commonly accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

pub const SHA1: DigestAlgorithm = DigestAlgorithm::Sha1;
pub const SHA256: DigestAlgorithm = DigestAlgorithm::Sha256;
pub const SHA384: DigestAlgorithm = DigestAlgorithm::Sha384;
pub const SHA512: DigestAlgorithm = DigestAlgorithm::Sha512;

impl DigestAlgorithm {
    /// The name by which Hawk configurations refer to this algorithm.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<DigestAlgorithm> {
        match s {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
