//! Construction of the Hawk normalized request and payload strings.
//!
//! These strings are what both parties sign or hash, so every field, its casing, and the
//! trailing newline must match other Hawk implementations exactly.

use crate::error::*;
use crate::header::{parse_authz_header_or, AuthParams};
use crate::request::RequestFields;

const HEADER_TAG: &str = "hawk.1.header";
const PAYLOAD_TAG: &str = "hawk.1.payload";

/// The fields of a normalized request string, already extracted from a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestString<'a> {
    pub ts: &'a str,
    pub nonce: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub host: &'a str,
    pub port: &'a str,
    pub hash: &'a str,
    pub ext: &'a str,
}

/// Render the normalized request string.  The method is uppercased and the host lowercased;
/// everything else is used verbatim.
pub fn request_string(r: &RequestString) -> String {
    let method = r.method.to_uppercase();
    let host = r.host.to_lowercase();
    let mut s = String::new();
    for field in &[
        HEADER_TAG,
        r.ts,
        r.nonce,
        method.as_str(),
        r.path,
        host.as_str(),
        r.port,
        r.hash,
        r.ext,
    ] {
        s.push_str(field);
        s.push('\n');
    }
    s
}

/// Render the normalized payload string, or `None` if there is no body to hash.
///
/// Only the media type of `content_type` is used: parameters after `;` are dropped and the rest
/// is trimmed and lowercased.
pub fn normalized_payload_string(content_type: Option<&str>, body: Option<&str>) -> Option<String> {
    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return None,
    };
    let content_type = content_type
        .and_then(|ct| ct.split(';').next())
        .unwrap_or("")
        .trim()
        .to_lowercase();
    Some(format!("{}\n{}\n{}\n", PAYLOAD_TAG, content_type, body))
}

/// Split a `Host` value into host and port, falling back to the scheme's default port.
pub fn host_and_port<'a>(host: &'a str, scheme: &str) -> Result<(&'a str, &'a str)> {
    if let Some(colon) = host.rfind(':') {
        // a colon inside an IPv6 literal is not a port separator
        if !host[colon..].contains(']') {
            return Ok((&host[..colon], &host[colon + 1..]));
        }
    }
    match scheme {
        "http" => Ok((host, "80")),
        "https" => Ok((host, "443")),
        _ => Err(Error::UnsupportedScheme(scheme.to_string())),
    }
}

/// Build the normalized request string for a request.
///
/// `params` defaults to the parsed `Authorization` header of the request, treated as empty if
/// missing or malformed.  `server_hash`, when given, is used in place of the `hash` parameter;
/// servers that have already hashed the payload pass it here.
pub fn normalized_request_string(
    fields: &RequestFields,
    params: Option<&AuthParams>,
    server_hash: Option<&str>,
) -> Result<String> {
    let parsed;
    let params = match params {
        Some(params) => params,
        None => {
            parsed = parse_authz_header_or(fields.authorization.as_deref(), AuthParams::default());
            &parsed
        }
    };

    let ts = params.get("ts").ok_or(Error::MissingTs)?;
    let nonce = params.get("nonce").ok_or(Error::MissingNonce)?;
    let (host, port) = host_and_port(&fields.host, &fields.scheme)?;
    let hash = match server_hash {
        Some(hash) => hash,
        None => params.get("hash").unwrap_or(""),
    };

    Ok(request_string(&RequestString {
        ts,
        nonce,
        method: &fields.method,
        path: &fields.path_and_query,
        host,
        port,
        hash,
        ext: params.get("ext").unwrap_or(""),
    }))
}
