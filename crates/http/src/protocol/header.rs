//! Header field parsing and lookup.
//!
//! A [`HeaderTable`] is filled line by line while a header block is decoded and
//! frozen into an [`http::HeaderMap`] once the blank terminator line is seen.
//! Names are case-insensitive (stored lower-cased) and values are trimmed. When a
//! name occurs more than once the last occurrence wins; multi-valued fields such as
//! `Set-Cookie` therefore keep only their final value.

use http::header::{CONNECTION, HeaderName};
use http::{HeaderMap, HeaderValue};

use crate::protocol::ParseError;

/// Ordered, case-insensitive header table for a single message.
#[derive(Debug, Default, Clone)]
pub struct HeaderTable {
    inner: HeaderMap,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `line` as a `name: value` field and stores it, replacing any previous
    /// value stored under the same name.
    pub fn insert_line(&mut self, line: &str) -> Result<(), ParseError> {
        let (name, value) = parse_header(line)?;
        self.inner.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        header_str(&self.inner, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_inner(self) -> HeaderMap {
        self.inner
    }
}

/// Splits a header line on its first `:`.
///
/// The name is trimmed and lower-cased, the value is trimmed but keeps its case.
/// A line without `:` or with an empty name is rejected.
pub fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), ParseError> {
    let (name, value) =
        line.split_once(':').ok_or_else(|| ParseError::invalid_header(format!("missing ':' in {line:?}")))?;

    let name = name.trim();
    let name = HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
        .map_err(|_| ParseError::invalid_header(format!("invalid header name {name:?}")))?;

    let value = value.trim();
    let value = HeaderValue::from_bytes(value.as_bytes())
        .map_err(|_| ParseError::invalid_header(format!("invalid value for header {name}")))?;

    Ok((name, value))
}

/// Looks up a header value as text. Values that are not valid visible ASCII are
/// treated as absent.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Returns true if the message asks for the connection to be closed after it.
pub fn wants_close(headers: &HeaderMap) -> bool {
    header_str(headers, CONNECTION.as_str()).is_some_and(|value| value.trim().eq_ignore_ascii_case("close"))
}
