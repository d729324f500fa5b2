use crate::error::*;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// The parameters of an `Authorization` header value, such as
/// `Hawk id="dh37fgj492je", ts="1353832234", nonce="j4h3g2"`.
///
/// The scheme name is kept apart from the parameters.  Parameters keep the order in which they
/// first appeared; setting an existing key replaces its value in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthParams {
    scheme: String,
    params: IndexMap<String, String>,
}

impl AuthParams {
    /// Create an empty set of parameters for the given scheme.
    pub fn new<S: Into<String>>(scheme: S) -> Self {
        AuthParams {
            scheme: scheme.into(),
            params: IndexMap::new(),
        }
    }

    /// Parse a header value.  A missing value is not handled here; see `parse_authz_header`.
    pub fn parse(value: &str) -> Result<AuthParams> {
        let value = value.trim_start();
        let (scheme, rest) = match value.find(char::is_whitespace) {
            Some(i) => (&value[..i], value[i..].trim_start()),
            None => (value, ""),
        };
        if scheme.is_empty() {
            return Err(Error::MalformedCredentials(
                "header has no scheme".to_string(),
            ));
        }

        let mut params = AuthParams::new(scheme);
        for chunk in split_params(rest)? {
            // split_params only returns chunks that passed is_complete_param
            let (key, value) = match chunk.trim().split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            let value = if value.starts_with('"') {
                unquote(&value[1..value.len() - 1])?
            } else {
                value.to_string()
            };
            params.insert(key, value);
        }
        Ok(params)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// True if the scheme is exactly `Hawk`.
    pub fn is_hawk(&self) -> bool {
        self.scheme == "Hawk"
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Set a parameter, returning the previous value if there was one.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for AuthParams {
    fn default() -> Self {
        AuthParams::new("Hawk")
    }
}

impl FromStr for AuthParams {
    type Err = Error;
    fn from_str(s: &str) -> Result<AuthParams> {
        AuthParams::parse(s)
    }
}

/// Formats as a complete header value, with every parameter quoted.
impl fmt::Display for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.scheme)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}=\"", sep, key)?;
            for c in value.chars() {
                if c == '"' || c == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{}", c)?;
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}

/// Parse an optional `Authorization` header value.
///
/// A missing header is `Error::MissingCredentials`; a header that does not follow the
/// parameter grammar is `Error::MalformedCredentials`.
pub fn parse_authz_header(header: Option<&str>) -> Result<AuthParams> {
    match header {
        Some(value) => AuthParams::parse(value),
        None => Err(Error::MissingCredentials),
    }
}

/// Like `parse_authz_header`, but returns `default` in place of a missing or malformed header.
pub fn parse_authz_header_or(header: Option<&str>, default: AuthParams) -> AuthParams {
    match parse_authz_header(header) {
        Ok(params) => params,
        Err(_) => default,
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Check whether a comma-delimited chunk is a whole `key=value` parameter.  A quoted value is
/// complete only once its closing quote is found, and a quote preceded by a backslash does not
/// close it.
fn is_complete_param(chunk: &str) -> bool {
    let chunk = chunk.trim();
    let eq = match chunk.find('=') {
        Some(eq) => eq,
        None => return false,
    };
    if !is_token(&chunk[..eq]) {
        return false;
    }
    let value = &chunk[eq + 1..];
    if is_token(value) || value == "\"\"" {
        return true;
    }
    if value.len() < 3 || !value.starts_with('"') || !value.ends_with('"') {
        return false;
    }
    let inner = &value[1..value.len() - 1];
    let mut chars = inner.chars();
    match chars.next_back() {
        Some('\\') | None => false,
        // line feeds are only tolerated as the last character before the closing quote
        Some(_) => !chars.as_str().contains('\n'),
    }
}

/// Split the parameter list on commas, re-joining chunks until each one is a complete
/// parameter, so that commas inside quoted values survive.
fn split_params(params: &str) -> Result<Vec<String>> {
    let mut chunks: Vec<String> = vec![];
    if params.is_empty() {
        return Ok(chunks);
    }
    for raw in params.split(',') {
        match chunks.last_mut() {
            Some(last) if !is_complete_param(last) => {
                last.push(',');
                last.push_str(raw);
            }
            _ => chunks.push(raw.to_string()),
        }
    }
    match chunks.last() {
        Some(last) if is_complete_param(last) => Ok(chunks),
        _ => Err(Error::MalformedCredentials(
            "malformed auth parameters".to_string(),
        )),
    }
}

/// Remove backslash-escapes from the inside of a quoted string, refusing bare quotes.
fn unquote(inner: &str) -> Result<String> {
    let mut prev = None;
    for c in inner.chars() {
        if c == '"' && prev != Some('\\') {
            return Err(Error::MalformedCredentials(
                "unescaped quote in quoted-string".to_string(),
            ));
        }
        prev = Some(c);
    }

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next != '\n' => {
                value.push(next);
                chars.next();
            }
            _ => value.push(c),
        }
    }
    Ok(value)
}
