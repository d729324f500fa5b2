use crate::crypto::CryptoError;
use failure::Fail;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Fail, Debug)]
pub enum Error {
    #[fail(display = "Missing Authorization header")]
    MissingCredentials,

    #[fail(display = "Malformed Authorization header: {}", _0)]
    MalformedCredentials(String),

    #[fail(display = "Unknown scheme {:?} has no default port", _0)]
    UnsupportedScheme(String),

    #[fail(display = "Unknown digest algorithm {:?}", _0)]
    UnknownAlgorithm(String),

    #[fail(display = "Missing `ts` attribute in Hawk header")]
    MissingTs,

    #[fail(display = "Missing `nonce` attribute in Hawk header")]
    MissingNonce,

    #[fail(display = "{} must be ASCII", _0)]
    NonAscii(&'static str),

    #[fail(display = "Invalid request: {}", _0)]
    InvalidRequest(String),

    #[fail(display = "{}", _0)]
    Crypto(#[fail(cause)] CryptoError),
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::Crypto(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidRequest(format!("invalid url: {}", e))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::InvalidRequest(format!("not valid UTF-8: {}", e))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(e: http::header::ToStrError) -> Self {
        Error::InvalidRequest(format!("unreadable header value: {}", e))
    }
}
