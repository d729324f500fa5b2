use crate::error::*;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use std::convert::TryFrom;
use std::str;
use url::Url;

/// The facts about an HTTP request that Hawk signs.
///
/// `host` is the value of the `Host` header and may carry an explicit `:port`.  `body` is the
/// request entity as text; Hawk hashes payloads as UTF-8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestFields {
    pub method: String,
    pub path_and_query: String,
    pub scheme: String,
    pub host: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl RequestFields {
    /// Describe a request without headers or a body.
    pub fn new<S>(method: S, scheme: S, host: S, path_and_query: S) -> Self
    where
        S: Into<String>,
    {
        RequestFields {
            method: method.into(),
            path_and_query: path_and_query.into(),
            scheme: scheme.into(),
            host: host.into(),
            authorization: None,
            content_type: None,
            body: None,
        }
    }

    /// Set the raw `Authorization` header value.
    pub fn authorization<S: Into<String>>(mut self, value: S) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Set the request entity and its content type.
    pub fn body<S: Into<String>>(mut self, content_type: S, body: S) -> Self {
        self.content_type = Some(content_type.into());
        self.body = Some(body.into());
        self
    }

    /// Adapt an `http::Request`.
    pub fn from_http<B: AsRef<[u8]>>(req: &http::Request<B>) -> Result<Self> {
        RequestFields::try_from(RequestSource::from(req))
    }

    /// Adapt a complete HTTP/1.x request message.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        RequestFields::try_from(RequestSource::Raw(raw))
    }

    /// Adapt a request given as a URL, a set of headers and an optional body.
    pub fn from_url(
        method: &str,
        url: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<Self> {
        RequestFields::try_from(RequestSource::Parts {
            method,
            url,
            headers,
            body,
        })
    }
}

/// The request representations that can be turned into `RequestFields`.
#[derive(Debug)]
pub enum RequestSource<'a> {
    /// A structured request, usually created with `From<&http::Request<B>>`.
    Http {
        method: &'a http::Method,
        uri: &'a http::Uri,
        headers: &'a HeaderMap,
        body: &'a [u8],
    },
    /// An HTTP/1.x message: request line, headers, blank line, body.
    Raw(&'a [u8]),
    /// An absolute URL with headers and an optional body.
    Parts {
        method: &'a str,
        url: &'a str,
        headers: &'a HeaderMap,
        body: Option<&'a str>,
    },
}

impl<'a, B: AsRef<[u8]>> From<&'a http::Request<B>> for RequestSource<'a> {
    fn from(req: &'a http::Request<B>) -> Self {
        RequestSource::Http {
            method: req.method(),
            uri: req.uri(),
            headers: req.headers(),
            body: req.body().as_ref(),
        }
    }
}

impl<'a> TryFrom<RequestSource<'a>> for RequestFields {
    type Error = Error;

    fn try_from(source: RequestSource<'a>) -> Result<Self> {
        match source {
            RequestSource::Http {
                method,
                uri,
                headers,
                body,
            } => {
                let authority = match (uri.host(), uri.port_u16()) {
                    (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
                    (Some(host), None) => Some(host.to_string()),
                    _ => None,
                };
                Ok(RequestFields {
                    method: method.as_str().to_string(),
                    path_and_query: uri
                        .path_and_query()
                        .map(|pq| pq.as_str())
                        .unwrap_or("/")
                        .to_string(),
                    scheme: uri.scheme_str().unwrap_or("http").to_string(),
                    host: host_from(headers, authority)?,
                    authorization: header_str(headers, &AUTHORIZATION)?,
                    content_type: header_str(headers, &CONTENT_TYPE)?,
                    body: body_text(body)?,
                })
            }
            RequestSource::Raw(raw) => parse_message(raw),
            RequestSource::Parts {
                method,
                url,
                headers,
                body,
            } => {
                let url = Url::parse(url)?;
                let authority = url.host_str().map(|host| match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                });
                let path_and_query = match url.query() {
                    Some(query) => format!("{}?{}", url.path(), query),
                    None => url.path().to_string(),
                };
                Ok(RequestFields {
                    method: method.to_string(),
                    path_and_query,
                    scheme: url.scheme().to_string(),
                    host: host_from(headers, authority)?,
                    authorization: header_str(headers, &AUTHORIZATION)?,
                    content_type: header_str(headers, &CONTENT_TYPE)?,
                    body: body.filter(|b| !b.is_empty()).map(str::to_string),
                })
            }
        }
    }
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Result<Option<String>> {
    match headers.get(name) {
        Some(value) => Ok(Some(value.to_str()?.to_string())),
        None => Ok(None),
    }
}

/// The `Host` header wins over the authority of the request target.
fn host_from(headers: &HeaderMap, authority: Option<String>) -> Result<String> {
    match header_str(headers, &HOST)? {
        Some(host) => Ok(host),
        None => authority.ok_or_else(|| Error::InvalidRequest("request has no host".to_string())),
    }
}

fn body_text(body: &[u8]) -> Result<Option<String>> {
    if body.is_empty() {
        return Ok(None);
    }
    Ok(Some(str::from_utf8(body)?.to_string()))
}

fn invalid<S: Into<String>>(msg: S) -> Error {
    Error::InvalidRequest(msg.into())
}

/// Most headers a raw request message may carry.
const MAX_HEADERS: usize = 64;

/// Parse an HTTP/1.x request message.  The body is cut to `Content-Length` when one is given.
fn parse_message(raw: &[u8]) -> Result<RequestFields> {
    let mut header_buf = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut header_buf);
    let head_len = match req.parse(raw) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Err(invalid("incomplete request head")),
        Err(e) => return Err(invalid(format!("bad request head: {}", e))),
    };
    let body = &raw[head_len..];
    let method = req.method.ok_or_else(|| invalid("request has no method"))?;
    let target = req.path.ok_or_else(|| invalid("request has no target"))?;

    let mut headers = HeaderMap::new();
    for header in req.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| invalid(format!("bad header name {:?}", header.name)))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|_| invalid(format!("bad value for header {}", name)))?;
        headers.append(name, value);
    }

    let body = match header_str(&headers, &CONTENT_LENGTH)? {
        Some(len) => {
            let len: usize = len
                .trim()
                .parse()
                .map_err(|_| invalid(format!("bad content-length {:?}", len)))?;
            if len > body.len() {
                return Err(invalid(format!(
                    "content-length {} exceeds the {} body bytes present",
                    len,
                    body.len()
                )));
            }
            &body[..len]
        }
        None => body,
    };

    if target.starts_with("http://") || target.starts_with("https://") {
        let body = body_text(body)?;
        return RequestFields::try_from(RequestSource::Parts {
            method,
            url: target,
            headers: &headers,
            body: body.as_ref().map(String::as_str),
        });
    }

    Ok(RequestFields {
        method: method.to_string(),
        path_and_query: target.to_string(),
        scheme: "http".to_string(),
        host: host_from(&headers, None)?,
        authorization: header_str(&headers, &AUTHORIZATION)?,
        content_type: header_str(&headers, &CONTENT_TYPE)?,
        body: body_text(body)?,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_http_request() {
        let req = http::Request::builder()
            .method("POST")
            .uri("https://example.com/resource/1?b=1&a=2")
            .header(AUTHORIZATION, "Hawk id=\"x\"")
            .header(CONTENT_TYPE, "text/plain")
            .body("hello".as_bytes().to_vec())
            .unwrap();
        let fields = RequestFields::from_http(&req).unwrap();
        assert_eq!(
            fields,
            RequestFields::new("POST", "https", "example.com", "/resource/1?b=1&a=2")
                .authorization("Hawk id=\"x\"")
                .body("text/plain", "hello")
        );
    }

    #[test]
    fn from_http_request_host_header_and_port() {
        let req = http::Request::builder()
            .uri("/resource")
            .header(HOST, "Example.com:8000")
            .body(Vec::<u8>::new())
            .unwrap();
        let fields = RequestFields::from_http(&req).unwrap();
        assert_eq!(fields.scheme, "http");
        assert_eq!(fields.host, "Example.com:8000");
        assert_eq!(fields.path_and_query, "/resource");
        assert_eq!(fields.body, None);

        let req = http::Request::builder()
            .uri("http://localhost:9999/")
            .body(Vec::<u8>::new())
            .unwrap();
        assert_eq!(RequestFields::from_http(&req).unwrap().host, "localhost:9999");
    }

    #[test]
    fn from_http_request_without_host() {
        let req = http::Request::builder().uri("/x").body(Vec::<u8>::new()).unwrap();
        assert!(RequestFields::from_http(&req).is_err());
    }

    #[test]
    fn from_http_request_non_utf8_body() {
        let req = http::Request::builder()
            .uri("http://example.com/")
            .body(vec![0xff, 0xfe])
            .unwrap();
        assert!(RequestFields::from_http(&req).is_err());
    }

    #[test]
    fn from_bytes_get() {
        let fields = RequestFields::from_bytes(
            b"GET /resource/1?b=1&a=2 HTTP/1.1\r\nHost: example.com:8000\r\n\r\n",
        )
        .unwrap();
        assert_eq!(
            fields,
            RequestFields::new("GET", "http", "example.com:8000", "/resource/1?b=1&a=2")
        );
    }

    #[test]
    fn from_bytes_post_with_authorization() {
        let fields = RequestFields::from_bytes(
            b"POST /resource/1 HTTP/1.1\r\n\
              Host: example.com:8000\r\n\
              Content-Type: application/json; charset=utf-8\r\n\
              Content-Length: 26\r\n\
              Authorization: Hawk     id=\"dh37fgj492je\",    ts=\"1353832234\"\r\n\
              \r\n\
              {\"test\": \"just some text\"}",
        )
        .unwrap();
        assert_eq!(
            fields.authorization.as_ref().map(String::as_str),
            Some("Hawk     id=\"dh37fgj492je\",    ts=\"1353832234\"")
        );
        assert_eq!(
            fields.content_type.as_ref().map(String::as_str),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(
            fields.body.as_ref().map(String::as_str),
            Some("{\"test\": \"just some text\"}")
        );
    }

    #[test]
    fn from_bytes_honors_content_length() {
        let fields = RequestFields::from_bytes(
            b"PUT / HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\n\r\nabcdef",
        )
        .unwrap();
        assert_eq!(fields.body.as_ref().map(String::as_str), Some("abc"));
    }

    #[test]
    fn from_bytes_lf_only_body_with_crlf() {
        let fields = RequestFields::from_bytes(
            b"POST / HTTP/1.1\nHost: a\nContent-Type: text/plain\n\nline1\r\n\r\nline2",
        )
        .unwrap();
        assert_eq!(fields.host, "a");
        assert_eq!(
            fields.body.as_ref().map(String::as_str),
            Some("line1\r\n\r\nline2")
        );
    }

    #[test]
    fn from_bytes_short_body() {
        match RequestFields::from_bytes(b"PUT / HTTP/1.1\r\nHost: a\r\nContent-Length: 100\r\n\r\nabc") {
            Err(Error::InvalidRequest(_)) => {}
            r => panic!("expected InvalidRequest, got {:?}", r),
        }
    }

    #[test]
    fn from_bytes_folded_header_rejected() {
        assert!(RequestFields::from_bytes(
            b"GET / HTTP/1.1\r\nHost: a\r\nAuthorization: Hawk id=\"x\",\r\n  ts=\"1\"\r\n\r\n",
        )
        .is_err());
    }

    #[test]
    fn from_bytes_absolute_target() {
        let fields =
            RequestFields::from_bytes(b"GET https://example.com/x?y=1 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(fields.scheme, "https");
        assert_eq!(fields.host, "example.com");
        assert_eq!(fields.path_and_query, "/x?y=1");
    }

    #[test]
    fn from_bytes_errors() {
        assert!(RequestFields::from_bytes(b"").is_err());
        assert!(RequestFields::from_bytes(b"GET /\r\nHost: a\r\n\r\n").is_err());
        assert!(RequestFields::from_bytes(b"GET / HTTP/1.1\r\n\r\n").is_err());
        assert!(RequestFields::from_bytes(b"GET / HTTP/1.1\r\nHost a\r\n\r\n").is_err());
        assert!(
            RequestFields::from_bytes(b"GET / HTTP/1.1\r\nHost: a\r\nContent-Length: x\r\n\r\n")
                .is_err()
        );
    }

    #[test]
    fn from_url_parts() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let fields = RequestFields::from_url(
            "PUT",
            "https://Example.com:8443/a/b?c=d",
            &headers,
            Some("payload"),
        )
        .unwrap();
        assert_eq!(
            fields,
            RequestFields::new("PUT", "https", "example.com:8443", "/a/b?c=d")
                .body("text/plain", "payload")
        );
    }

    #[test]
    fn from_url_host_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("proxy.example.com"));
        let fields = RequestFields::from_url("GET", "http://10.0.0.1/", &headers, None).unwrap();
        assert_eq!(fields.host, "proxy.example.com");
        assert_eq!(fields.body, None);
    }

    #[test]
    fn from_url_invalid() {
        assert!(RequestFields::from_url("GET", "not a url", &HeaderMap::new(), None).is_err());
    }
}
