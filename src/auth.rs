//! Signing and verification of whole requests.
//!
//! These functions combine the header parser, the canonicalizer and the signer.  Nonce
//! tracking and timestamp skew are left to the caller: `check_signature` only answers whether
//! the MAC (and, optionally, the payload hash) is correct.

use crate::b64;
use crate::compare::strings_differ;
use crate::credentials::{Credentials, Key};
use crate::crypto;
use crate::error::*;
use crate::header::{parse_authz_header_or, AuthParams};
use crate::normalize::{normalized_payload_string, normalized_request_string};
use crate::request::RequestFields;
use crate::sign::{hash_payload_string, sign_with_key, Signature};
use crate::DigestAlgorithm;
use base64::Engine;
use http::header::{HeaderValue, AUTHORIZATION};
use log::debug;
use std::time::{SystemTime, UNIX_EPOCH};

/// Random bytes in a generated nonce.
const NONCE_BYTES: usize = 5;

/// Options for `sign_request` and `get_signature`.
#[derive(Clone, Debug)]
pub struct SignOptions {
    /// Hash the request body into the `hash` parameter.  Defaults to true.
    pub include_payload_hash: bool,
    /// Digest for the payload hash.  Defaults to the key's algorithm.
    pub algorithm: Option<DigestAlgorithm>,
    /// Parameters to sign with, instead of those in the request's `Authorization` header.
    pub params: Option<AuthParams>,
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            include_payload_hash: true,
            algorithm: None,
            params: None,
        }
    }
}

/// Options for `check_signature`.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Reject requests whose header has no `hash` parameter.  Defaults to false.
    pub require_payload_hash: bool,
    /// When the header has a `hash` parameter, check it against the body.  Defaults to true.
    pub verify_payload_hash: bool,
    /// Digest for the payload hash.  Defaults to the key's algorithm.
    pub algorithm: Option<DigestAlgorithm>,
    /// Parameters to check, instead of those in the request's `Authorization` header.
    pub params: Option<AuthParams>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            require_payload_hash: false,
            verify_payload_hash: true,
            algorithm: None,
            params: None,
        }
    }
}

fn request_params(fields: &RequestFields, params: Option<&AuthParams>) -> AuthParams {
    match params {
        Some(params) => params.clone(),
        None => parse_authz_header_or(fields.authorization.as_deref(), AuthParams::default()),
    }
}

fn random_nonce() -> Result<String> {
    let mut bytes = [0u8; NONCE_BYTES];
    crypto::get_cryptographer().rand_bytes(&mut bytes)?;
    Ok(b64::STANDARD_ENGINE.encode(bytes))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn sign_params(fields: &RequestFields, params: &AuthParams, key: &Key) -> Result<Signature> {
    let canonical = normalized_request_string(fields, Some(params), None)?;
    sign_with_key(&canonical, key)
}

fn set_payload_hash(fields: &RequestFields, params: &mut AuthParams, algorithm: DigestAlgorithm) -> Result<()> {
    match hash_payload(fields, algorithm)? {
        Some(hash) => {
            params.insert("hash", hash);
        }
        None => {
            params.remove("hash");
        }
    }
    Ok(())
}

/// Sign a request, setting `fields.authorization` and returning the new header value.
///
/// Parameters come from `options.params` or from the request's existing Hawk header, whose
/// `ts` and `nonce` are kept; a header with another scheme is discarded.  Missing `ts` and
/// `nonce` values are generated.
pub fn sign_request(
    fields: &mut RequestFields,
    credentials: &Credentials,
    options: &SignOptions,
) -> Result<String> {
    let existing = match options.params {
        Some(ref params) => params.clone(),
        None => {
            let params = request_params(fields, None);
            if params.is_hawk() {
                params
            } else {
                AuthParams::default()
            }
        }
    };
    let mut params = AuthParams::new("Hawk");
    for (k, v) in existing.iter() {
        params.insert(k, v);
    }

    params.insert("id", credentials.id.as_str());
    if !params.contains_key("ts") {
        params.insert("ts", now_secs().to_string());
    }
    if !params.contains_key("nonce") {
        params.insert("nonce", random_nonce()?);
    }
    if options.include_payload_hash {
        let algorithm = options.algorithm.unwrap_or_else(|| credentials.key.algorithm());
        set_payload_hash(fields, &mut params, algorithm)?;
    }

    let mac = sign_params(fields, &params, &credentials.key)?;
    params.insert("mac", mac.into_string());

    let header = params.to_string();
    fields.authorization = Some(header.clone());
    Ok(header)
}

/// Get the claimed Hawk id of a request, without verifying anything.
pub fn get_id(fields: &RequestFields, params: Option<&AuthParams>) -> Option<String> {
    let params = request_params(fields, params);
    if !params.is_hawk() {
        return None;
    }
    params.get("id").map(str::to_string)
}

/// Calculate the MAC for a request.  With `include_payload_hash`, the `hash` parameter is
/// replaced by the hash of the request body.
pub fn get_signature(fields: &RequestFields, key: &Key, options: &SignOptions) -> Result<Signature> {
    let mut params = request_params(fields, options.params.as_ref());
    if options.include_payload_hash {
        let algorithm = options.algorithm.unwrap_or_else(|| key.algorithm());
        set_payload_hash(fields, &mut params, algorithm)?;
    }
    sign_params(fields, &params, key)
}

/// Hash the request body, or return `None` if the request has no body.
pub fn hash_payload(fields: &RequestFields, algorithm: DigestAlgorithm) -> Result<Option<String>> {
    normalized_payload_string(fields.content_type.as_deref(), fields.body.as_deref())
        .map(|payload| hash_payload_string(&payload, algorithm))
        .transpose()
}

/// Check the `hash` parameter against the request body.  A missing `hash` or a missing body
/// does not verify.
pub fn verify_payload(
    fields: &RequestFields,
    params: Option<&AuthParams>,
    algorithm: DigestAlgorithm,
) -> Result<bool> {
    let params = request_params(fields, params);
    let claimed = match params.get("hash") {
        Some(hash) => hash,
        None => return Ok(false),
    };
    match hash_payload(fields, algorithm)? {
        Some(actual) => Ok(!strings_differ(claimed, &actual)),
        None => Ok(false),
    }
}

/// Check that a request is correctly signed with the given key.
///
/// The MAC is checked first, against the `hash` the client claimed; only then is the body
/// hashed, if it is to be verified at all.
pub fn check_signature(fields: &RequestFields, key: &Key, options: &CheckOptions) -> bool {
    match try_check_signature(fields, key, options) {
        Ok(valid) => valid,
        Err(e) => {
            debug!("Hawk signature check failed: {}", e);
            false
        }
    }
}

fn try_check_signature(fields: &RequestFields, key: &Key, options: &CheckOptions) -> Result<bool> {
    let params = request_params(fields, options.params.as_ref());
    let id = params.get("id").unwrap_or("");
    if !params.is_hawk() {
        debug!("not a Hawk Authorization header: {}", params.scheme());
        return Ok(false);
    }
    if options.require_payload_hash && !params.contains_key("hash") {
        debug!("Hawk header for id {:?} has no payload hash", id);
        return Ok(false);
    }
    let ts = params.get("ts").ok_or(Error::MissingTs)?;
    // surrounding whitespace is tolerated here, though it still goes into the MAC verbatim
    if ts.trim().parse::<i64>().is_err() {
        debug!("Hawk header for id {:?} has invalid ts {:?}", id, ts);
        return Ok(false);
    }
    let mac = match params.get("mac") {
        Some(mac) => mac,
        None => {
            debug!("Hawk header for id {:?} has no mac", id);
            return Ok(false);
        }
    };

    let expected = sign_params(fields, &params, key)?;
    if strings_differ(mac, expected.as_str()) {
        debug!("Hawk mac mismatch for id {:?}", id);
        return Ok(false);
    }

    if options.verify_payload_hash
        && params.contains_key("hash")
        && !verify_payload(
            fields,
            Some(&params),
            options.algorithm.unwrap_or_else(|| key.algorithm()),
        )?
    {
        debug!("Hawk payload hash mismatch for id {:?}", id);
        return Ok(false);
    }
    Ok(true)
}

/// Sign `http` requests in place.
pub trait SignRequest {
    /// Sign the request with the given credentials, setting its `Authorization` header.
    /// Returns the header value.
    fn sign_hawk(&mut self, credentials: &Credentials, options: &SignOptions) -> Result<String>;
}

impl<B: AsRef<[u8]>> SignRequest for http::Request<B> {
    fn sign_hawk(&mut self, credentials: &Credentials, options: &SignOptions) -> Result<String> {
        let mut fields = RequestFields::from_http(self)?;
        let header = sign_request(&mut fields, credentials, options)?;
        let value = HeaderValue::from_str(&header).map_err(|_| {
            Error::InvalidRequest("signed header is not a valid header value".to_string())
        })?;
        self.headers_mut().insert(AUTHORIZATION, value);
        Ok(header)
    }
}

/// Validate the Hawk signature of `http` requests.
pub trait ValidateRequest {
    fn validate_hawk(&self, key: &Key, options: &CheckOptions) -> bool;
}

impl<B: AsRef<[u8]>> ValidateRequest for http::Request<B> {
    fn validate_hawk(&self, key: &Key, options: &CheckOptions) -> bool {
        match RequestFields::from_http(self) {
            Ok(fields) => check_signature(&fields, key, options),
            Err(e) => {
                debug!("cannot validate request: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn credentials() -> Credentials {
        Credentials {
            id: "dh37fgj492je".to_string(),
            key: Key::from_ascii("werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn", DigestAlgorithm::Sha256)
                .unwrap(),
        }
    }

    fn post() -> RequestFields {
        RequestFields::new("POST", "http", "example.com:8000", "/resource/1?b=1&a=2")
            .body("application/json; charset=utf-8", "{\"test\": \"just some text\"}")
    }

    #[test]
    fn sign_then_check() {
        let creds = credentials();
        let mut fields = post();
        let header = sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        assert!(header.starts_with("Hawk id=\"dh37fgj492je\", ts=\""));
        assert_eq!(fields.authorization.as_ref(), Some(&header));

        let params = AuthParams::parse(&header).unwrap();
        assert_eq!(params.get("hash"), Some("Lj826IMSgrm1vnCFQNxaXasE8zHBXSWq2pPtnHEmaO8="));
        assert_eq!(params.get("nonce").map(str::len), Some(8));
        assert!(check_signature(&fields, &creds.key, &CheckOptions::default()));
    }

    #[test]
    fn sign_keeps_existing_ts_and_nonce() {
        let creds = credentials();
        let mut fields = post().authorization(
            "Hawk ts=\"1353832234\", nonce=\"j4h3g2\", ext=\"some-app-ext-data\"",
        );
        let header = sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        assert_eq!(
            header,
            "Hawk ts=\"1353832234\", nonce=\"j4h3g2\", ext=\"some-app-ext-data\", \
             id=\"dh37fgj492je\", hash=\"Lj826IMSgrm1vnCFQNxaXasE8zHBXSWq2pPtnHEmaO8=\", \
             mac=\"Tx7PoLWYtn3VJEc0GdkguHkEB281grYEtFycPhtln9w=\""
        );
    }

    #[test]
    fn sign_without_payload_hash() {
        let creds = credentials();
        let mut fields = post();
        let options = SignOptions {
            include_payload_hash: false,
            algorithm: None,
            params: Some(AuthParams::parse("Hawk ts=\"1353832234\", nonce=\"j4h3g2\", ext=\"some-app-ext-data\"").unwrap()),
        };
        let header = sign_request(&mut fields, &creds, &options).unwrap();
        let params = AuthParams::parse(&header).unwrap();
        assert_eq!(params.get("hash"), None);
        assert_eq!(params.get("mac"), Some("56wgBMHr4oIwA/dGZspMm6Zk4rnf3aiwwVeL0VtWoGo="));
    }

    #[test]
    fn sign_discards_other_schemes() {
        let creds = credentials();
        let mut fields = RequestFields::new("GET", "http", "example.com", "/")
            .authorization("Digest response=\"helloworld\"");
        let header = sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        let params = AuthParams::parse(&header).unwrap();
        assert!(params.is_hawk());
        assert_eq!(params.get("response"), None);
    }

    #[test]
    fn get_id_from_header() {
        let fields = RequestFields::new("GET", "http", "example.com", "/")
            .authorization("Hawk id=\"user1\", ts=\"1\", nonce=\"2\"");
        assert_eq!(get_id(&fields, None), Some("user1".to_string()));

        let fields = RequestFields::new("GET", "http", "example.com", "/")
            .authorization("OAuth id=\"user1\", ts=\"1\", nonce=\"2\"");
        assert_eq!(get_id(&fields, None), None);

        let fields = RequestFields::new("GET", "http", "example.com", "/")
            .authorization("Hawk ts=\"1\", nonce=\"2\"");
        assert_eq!(get_id(&fields, None), None);

        assert_eq!(get_id(&RequestFields::new("GET", "http", "example.com", "/"), None), None);
    }

    #[test]
    fn get_signature_recomputes_hash() {
        let creds = credentials();
        let fields = post().authorization(
            "Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", ext=\"some-app-ext-data\"",
        );
        let sig = get_signature(&fields, &creds.key, &SignOptions::default()).unwrap();
        assert_eq!(sig.as_str(), "Tx7PoLWYtn3VJEc0GdkguHkEB281grYEtFycPhtln9w=");

        let options = SignOptions {
            include_payload_hash: false,
            ..SignOptions::default()
        };
        let sig = get_signature(&fields, &creds.key, &options).unwrap();
        assert_eq!(sig.as_str(), "56wgBMHr4oIwA/dGZspMm6Zk4rnf3aiwwVeL0VtWoGo=");
    }

    #[test]
    fn hash_payload_of_empty_body() {
        let fields = RequestFields::new("GET", "http", "example.com", "/");
        assert_eq!(hash_payload(&fields, DigestAlgorithm::Sha256).unwrap(), None);
    }

    #[test]
    fn verify_payload_cases() {
        let fields = post().authorization("Hawk hash=\"Lj826IMSgrm1vnCFQNxaXasE8zHBXSWq2pPtnHEmaO8=\"");
        assert!(verify_payload(&fields, None, DigestAlgorithm::Sha256).unwrap());

        let modified = RequestFields {
            body: Some("{\"test\": \"modify b4 send\"}".to_string()),
            ..fields.clone()
        };
        assert!(!verify_payload(&modified, None, DigestAlgorithm::Sha256).unwrap());

        let no_hash = post().authorization("Hawk id=\"x\"");
        assert!(!verify_payload(&no_hash, None, DigestAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn check_fails_for_tampered_mac() {
        let creds = credentials();
        let mut fields = post();
        let header = sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        let mac = AuthParams::parse(&header).unwrap().get("mac").unwrap().to_string();
        fields.authorization = Some(header.replace(&mac, &format!("XXX{}", mac)));
        assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()));
    }

    #[test]
    fn check_fails_for_modified_body() {
        let creds = credentials();
        let mut fields = post();
        sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        fields.body = Some("{\"test\": \"modify b4 send\"}".to_string());
        assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()));

        // without payload verification only the MAC is checked
        let options = CheckOptions {
            verify_payload_hash: false,
            ..CheckOptions::default()
        };
        assert!(check_signature(&fields, &creds.key, &options));
    }

    #[test]
    fn check_require_payload_hash() {
        let creds = credentials();
        let mut fields = RequestFields::new("GET", "http", "example.com", "/");
        sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        assert!(check_signature(&fields, &creds.key, &CheckOptions::default()));
        let options = CheckOptions {
            require_payload_hash: true,
            ..CheckOptions::default()
        };
        assert!(!check_signature(&fields, &creds.key, &options));
    }

    #[test]
    fn check_fails_with_wrong_key() {
        let creds = credentials();
        let mut fields = post();
        sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        let other = Key::from_ascii("not-the-key", DigestAlgorithm::Sha256).unwrap();
        assert!(!check_signature(&fields, &other, &CheckOptions::default()));
    }

    #[test]
    fn check_fails_for_incomplete_headers() {
        let creds = credentials();
        for header in &[
            "Hawk ts=\"1\", nonce=\"2\"",
            "Hawk id=\"x\", nonce=\"2\", mac=\"abc\"",
            "Hawk id=\"x\", ts=\"soon\", nonce=\"2\", mac=\"abc\"",
            "Hawk id=\"x\", ts=\"1\", mac=\"abc\"",
            "Hawk id=\"x\", ts=\"1\", nonce=\"2\", mac=\"a\"b\"",
        ] {
            let fields = RequestFields::new("GET", "http", "example.com", "/").authorization(*header);
            assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()), "{}", header);
        }
        let fields = RequestFields::new("GET", "http", "example.com", "/");
        assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()));
    }

    #[test]
    fn check_fails_for_other_scheme() {
        let creds = credentials();
        let mut fields = RequestFields::new("GET", "http", "example.com", "/");
        let header = sign_request(&mut fields, &creds, &SignOptions::default()).unwrap();
        fields.authorization = Some(header.replacen("Hawk", "OAuth", 1));
        assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()));
    }

    #[test]
    fn payload_algorithm_from_options() {
        let creds = credentials();
        let mut fields = post();
        let options = SignOptions {
            algorithm: Some(DigestAlgorithm::Sha1),
            ..SignOptions::default()
        };
        let header = sign_request(&mut fields, &creds, &options).unwrap();
        let params = AuthParams::parse(&header).unwrap();
        let sha1_hash = hash_payload(&fields, DigestAlgorithm::Sha1).unwrap();
        assert_eq!(params.get("hash"), sha1_hash.as_deref());
        assert_eq!(params.get("hash").map(str::len), Some(28));

        let sha1_check = CheckOptions {
            algorithm: Some(DigestAlgorithm::Sha1),
            ..CheckOptions::default()
        };
        assert!(check_signature(&fields, &creds.key, &sha1_check));
        // the key's own sha256 does not match the sha1 payload hash
        assert!(!check_signature(&fields, &creds.key, &CheckOptions::default()));

        let sig = get_signature(&fields, &creds.key, &options).unwrap();
        assert_eq!(Some(sig.as_str()), params.get("mac"));
    }

    #[test]
    fn check_tolerates_padded_ts() {
        let creds = credentials();
        let mut fields = RequestFields::new("GET", "http", "example.com", "/");
        let options = SignOptions {
            params: Some(AuthParams::parse("Hawk ts=\" 1353832234 \", nonce=\"j4h3g2\"").unwrap()),
            ..SignOptions::default()
        };
        sign_request(&mut fields, &creds, &options).unwrap();
        assert!(check_signature(&fields, &creds.key, &CheckOptions::default()));
    }

    #[test]
    fn sign_http_request_in_place() {
        let creds = credentials();
        let mut req = http::Request::builder()
            .method("PUT")
            .uri("https://example.com/thing")
            .header(http::header::CONTENT_TYPE, "text/plain")
            .body("Thank you for flying Hawk".to_string())
            .unwrap();
        let header = req.sign_hawk(&creds, &SignOptions::default()).unwrap();
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap().to_str().unwrap(), header);
        assert!(req.validate_hawk(&creds.key, &CheckOptions::default()));

        *req.body_mut() = "Thank you for flying Hawk!".to_string();
        assert!(!req.validate_hawk(&creds.key, &CheckOptions::default()));
    }
}
