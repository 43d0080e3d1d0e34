//! HTTP/1.1 request parsing using the [`httparse`] crate.
//!
//! [`Request::parse`] turns a raw byte buffer into a structured request: the
//! query string is split off the path and parsed into an ordered multimap
//! (repeated keys keep every value), header names are matched
//! case-insensitively, and the body is kept as opaque [`Bytes`] — decoding it
//! is the handler's concern.

use std::collections::HashMap;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete — more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// A fully parsed HTTP/1.1 request.
///
/// # Examples
///
/// ```
/// use routekit::Request;
///
/// let raw = b"GET /hello?name=world HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/hello");
/// assert_eq!(request.query_param("name"), Some("world"));
/// assert_eq!(request.headers().get("host"), Some("localhost"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    raw_query: Option<String>,
    query: HashMap<String, Vec<String>>,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers supported per request.
    const MAX_HEADERS: usize = 64;

    /// Parse a raw HTTP/1.1 request from a byte slice.
    ///
    /// Returns the parsed `Request` and the byte offset at which the body
    /// begins in `buf` (immediately after the `\r\n\r\n` header terminator).
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] — more data is needed to complete the
    ///   request headers.
    /// - [`RequestError::Parse`] — the data is malformed.
    /// - [`RequestError::MissingField`] — method, path, or version is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method = Method::from(
            raw_req
                .method
                .ok_or(RequestError::MissingField { field: "method" })?,
        );

        let target = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;
        let (path, raw_query) = split_target(target);

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let query = raw_query.as_deref().map(parse_query).unwrap_or_default();

        // The buffer may hold more than one pipelined request; the body is
        // only the declared Content-Length worth of bytes (none without the
        // header), never the trailing remainder.
        let declared_len = header_map
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let body_end = buf.len().min(body_offset + declared_len);
        let body = Bytes::copy_from_slice(&buf[body_offset..body_end]);

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                raw_query,
                query,
                body,
            },
            body_offset,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path with the query string stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Returns the first value of a query parameter, decoded.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of a query parameter in the order it appeared in
    /// the URL. Empty when the key is absent.
    pub fn query_params(&self, key: &str) -> &[String] {
        self.query.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this
    /// request.
    ///
    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }

    /// Returns the `Content-Length` header parsed as a `usize`, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.parse().ok()
    }
}

// Split a request target into path and optional query string.
fn split_target(target: &str) -> (String, Option<String>) {
    match target.find('?') {
        Some(pos) => (target[..pos].to_owned(), Some(target[pos + 1..].to_owned())),
        None => (target.to_owned(), None),
    }
}

/// Parse a URL query string into an ordered multimap.
///
/// Repeated keys accumulate values in URL order. Keys and values are
/// form-decoded: `+` becomes a space and percent escapes are resolved;
/// components that do not decode as UTF-8 are kept verbatim.
fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        params
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    params
}

fn decode_component(component: &str) -> String {
    let with_spaces = component.replace('+', " ");
    match percent_decode_str(&with_spaces).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => with_spaces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method().as_str(), "GET");
        assert_eq!(req.path(), "/");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(offset, raw.len()); // no body
    }

    #[test]
    fn query_string_is_stripped_from_path() {
        let raw = b"GET /search?q=rust&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query_string(), Some("q=rust&page=2"));
        assert_eq!(req.query_param("q"), Some("rust"));
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[test]
    fn repeated_query_keys_keep_every_value() {
        let raw = b"GET /s?tag=a&tag=b&tag=c HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_params("tag"), ["a", "b", "c"]);
        // First value wins for the scalar accessor.
        assert_eq!(req.query_param("tag"), Some("a"));
    }

    #[test]
    fn query_components_are_decoded() {
        let raw = b"GET /s?q=hello+world&name=J%C3%BCrgen HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_param("q"), Some("hello world"));
        assert_eq!(req.query_param("name"), Some("J\u{fc}rgen"));
    }

    #[test]
    fn valueless_query_key_is_empty_string() {
        let raw = b"GET /s?flag&x=1 HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_param("flag"), Some(""));
        assert_eq!(req.query_param("x"), Some("1"));
    }

    #[test]
    fn absent_query_key_is_empty_slice() {
        let raw = b"GET /s HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(req.query_params("missing").is_empty());
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn keep_alive_http11_default() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(req.is_keep_alive());
    }

    #[test]
    fn connection_close() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn body_stops_at_content_length_with_pipelined_request() {
        // Keep-alive clients may legally send the next request before the
        // first response; its bytes must not leak into the first body.
        let raw = b"POST /u HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\n\r\nhelloGET /next HTTP/1.1\r\nHost: a\r\n\r\n";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
        assert_eq!(
            &raw[body_offset + req.content_length().unwrap()..],
            b"GET /next HTTP/1.1\r\nHost: a\r\n\r\n"
        );
    }

    #[test]
    fn request_without_content_length_has_empty_body() {
        let raw = b"GET /a HTTP/1.1\r\nHost: a\r\n\r\nGET /b HTTP/1.1\r\nHost: a\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/a");
        assert!(req.body().is_empty());
    }

    #[test]
    fn content_length_and_body_offset() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&raw[body_offset..], b"hello");
        assert_eq!(req.body().as_ref(), b"hello");
    }
}
