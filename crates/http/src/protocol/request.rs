//! HTTP request head handling.
//!
//! [`RequestHeader`] wraps an `http::Request<()>` and is used on both sides of the
//! wire: the server decodes it from a request line plus header block, and the client
//! builds one and hands it to the request encoder.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::ParseError;

#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|_| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Only POST and PUT must carry a framed body; other methods may carry one
    /// when they say so through their framing headers.
    pub fn need_body(&self) -> bool {
        matches!(self.method(), &Method::POST | &Method::PUT)
    }
}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

/// Maps the version token of a start line.
///
/// Unknown `HTTP/x.y` tokens are kept as a non-1.1 version so that the server can
/// answer them with `501 Not Implemented` instead of rejecting the message outright.
pub fn parse_version(token: &str) -> Result<Version, ParseError> {
    match token {
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/2" | "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3" | "HTTP/3.0" => Ok(Version::HTTP_3),
        // other http versions currently not supported
        other if other.starts_with("HTTP/") => Ok(Version::HTTP_09),
        other => Err(ParseError::invalid_version(other)),
    }
}

/// Escapes spaces in a request path before it is put on the wire.
pub fn escape_path(path: &str) -> String {
    path.replace(' ', "%20")
}

/// Reverses [`escape_path`] for a received request target.
pub fn unescape_path(path: &str) -> String {
    path.replace("%20", " ")
}
