//! Header block decoders for requests and responses.
//!
//! A header block is a start line, any number of `name: value` lines and a blank
//! terminator line. Every line goes through the shared line reader, so CRLF and
//! bare LF terminators are both accepted and surrounding whitespace is dropped.
//! Blank lines in front of a start line are skipped.
//!
//! Nothing is consumed until the whole block is buffered; the block is then split
//! off the buffer in one step, leaving the body bytes in place.
//!
//! # Limits
//!
//! - Maximum number of header lines: 64
//! - Maximum header block size: 8KB
//!
//! # Framing
//!
//! Once the block is parsed the decoder decides how the body is framed and reports
//! it as a [`PayloadSize`]:
//!
//! - `Content-Length` wins when present
//! - otherwise `Transfer-Encoding: chunked` selects chunked decoding
//! - otherwise a request that must carry a body (POST, PUT) or a response that may
//!   carry one is a framing error, never an empty body

use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri, Version};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::line::{find_line_end, is_blank, line_text, skip_blank_lines};
use crate::ensure;
use crate::protocol::{
    HeaderTable, ParseError, PayloadSize, ReasonPhrase, RequestHeader, ResponseHead, header_str, parse_version,
};

/// Maximum number of header lines allowed in one message
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for request heads: request line plus header block.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestHeaderDecoder;

/// Decoder for response heads: status line plus header block.
///
/// Whether a response has a body depends on the request it answers, so the decoder
/// must be told the method of that request before each response, see
/// [`ResponseHeaderDecoder::expect_response_to`].
#[derive(Debug, Clone)]
pub struct ResponseHeaderDecoder {
    request_method: Method,
}

impl Default for ResponseHeaderDecoder {
    fn default() -> Self {
        Self { request_method: Method::GET }
    }
}

impl ResponseHeaderDecoder {
    pub fn expect_response_to(&mut self, method: Method) {
        self.request_method = method;
    }
}

impl Decoder for RequestHeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a request head from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((header, payload_size)))` if a complete head was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if the start line, a header line or the framing is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((start_line, table)) = take_header_block(src)? else {
            return Ok(None);
        };

        let mut tokens = start_line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ParseError::invalid_start_line(start_line));
        };

        let mut request = Request::new(());
        *request.method_mut() = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::InvalidMethod)?;
        *request.uri_mut() = Uri::try_from(target).map_err(|_| ParseError::InvalidUri)?;
        *request.version_mut() = parse_version(version)?;
        *request.headers_mut() = table.into_inner();

        let header = RequestHeader::from(request);
        let payload_size = request_payload_size(&header)?;
        trace!(method = %header.method(), uri = %header.uri(), ?payload_size, "decoded request head");

        Ok(Some((header, payload_size)))
    }
}

impl Decoder for ResponseHeaderDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a response head from the provided bytes buffer.
    ///
    /// The status code is the second token of the status line once runs of
    /// whitespace are collapsed; everything after it is the reason phrase.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((status_line, table)) = take_header_block(src)? else {
            return Ok(None);
        };

        let mut tokens = status_line.split_whitespace();
        let version = tokens.next().ok_or_else(|| ParseError::invalid_start_line(&status_line))?;
        let code = tokens.next().ok_or_else(|| ParseError::invalid_status(format!("no status code in {status_line:?}")))?;
        let reason = tokens.collect::<Vec<_>>().join(" ");

        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| ParseError::invalid_status(format!("invalid status code {code:?}")))?;

        let mut head = Response::new(());
        *head.status_mut() = status;
        *head.version_mut() = parse_version(version)?;
        *head.headers_mut() = table.into_inner();
        head.extensions_mut().insert(ReasonPhrase::new(reason));

        let payload_size = response_payload_size(&self.request_method, &head)?;
        trace!(status = %head.status(), ?payload_size, "decoded response head");

        Ok(Some((head, payload_size)))
    }
}

/// Splits one complete header block off `src`.
///
/// Returns the start line and the parsed header fields, or `None` while the
/// terminating blank line has not arrived yet.
fn take_header_block(src: &mut BytesMut) -> Result<Option<(String, HeaderTable)>, ParseError> {
    skip_blank_lines(src);

    let mut block_end = None;
    let mut offset = 0;
    let mut lines = 0;
    while let Some(end) = find_line_end(&src[offset..]) {
        let line_end = offset + end;
        if offset > 0 && is_blank(&src[offset..line_end]) {
            block_end = Some(line_end);
            break;
        }
        lines += 1;
        offset = line_end;
    }

    let Some(block_end) = block_end else {
        ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
        ensure!(lines <= MAX_HEADER_NUM + 1, ParseError::too_many_headers(MAX_HEADER_NUM));
        return Ok(None);
    };

    ensure!(block_end <= MAX_HEADER_BYTES, ParseError::too_large_header(block_end, MAX_HEADER_BYTES));
    ensure!(lines <= MAX_HEADER_NUM + 1, ParseError::too_many_headers(MAX_HEADER_NUM));

    let raw_block = src.split_to(block_end);
    let mut block = &raw_block[..];

    let mut start_line = None;
    let mut table = HeaderTable::new();
    while let Some(end) = find_line_end(block) {
        let line = line_text(&block[..end]);
        block = &block[end..];

        match start_line {
            None => start_line = Some(line),
            Some(_) if line.is_empty() => break,
            Some(_) => table.insert_line(&line)?,
        }
    }

    match start_line {
        Some(start_line) => Ok(Some((start_line, table))),
        None => Err(ParseError::TruncatedHeader),
    }
}

/// Framing of a request body.
///
/// Only POST and PUT are required to be framed; a GET without framing headers
/// simply has no body. Requests of other versions than HTTP/1.1 are answered
/// with 501 and never read past their head, so they are not held to that.
fn request_payload_size(header: &RequestHeader) -> Result<PayloadSize, ParseError> {
    match framing(header.headers())? {
        Some(size) => Ok(size),
        None if header.need_body() && header.version() == Version::HTTP_11 => Err(ParseError::UnframedBody),
        None => Ok(PayloadSize::new_empty()),
    }
}

/// Framing of a response body.
///
/// Responses to HEAD and 1xx, 204, 304 and 501 responses never carry body bytes
/// whatever their headers announce.
fn response_payload_size(request_method: &Method, head: &ResponseHead) -> Result<PayloadSize, ParseError> {
    let status = head.status();
    if *request_method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
        || status == StatusCode::NOT_IMPLEMENTED
    {
        return Ok(PayloadSize::new_empty());
    }

    framing(head.headers())?.ok_or(ParseError::UnframedBody)
}

/// Reads `Content-Length` and `Transfer-Encoding`, returning `None` when neither
/// frames the body.
fn framing(headers: &HeaderMap) -> Result<Option<PayloadSize>, ParseError> {
    if headers.contains_key(CONTENT_LENGTH) {
        let value = header_str(headers, CONTENT_LENGTH.as_str())
            .ok_or_else(|| ParseError::invalid_content_length("value is not visible ascii"))?;
        let length = value
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseError::invalid_content_length(format!("value {value} is not u64")))?;
        return Ok(Some(PayloadSize::new_length(length)));
    }

    if is_chunked(header_str(headers, TRANSFER_ENCODING.as_str())) {
        return Ok(Some(PayloadSize::new_chunked()));
    }

    Ok(None)
}

fn is_chunked(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use indoc::indoc;

    #[test]
    fn check_is_chunked() {
        assert!(!is_chunked(None));
        assert!(is_chunked(Some("chunked")));
        assert!(is_chunked(Some(" Chunked ")));
        assert!(!is_chunked(Some("gzip")));
    }

    #[test]
    fn test_bytes_mut_lens() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##};

        let mut bytes = BytesMut::from(str);

        let result = RequestHeaderDecoder.decode(&mut bytes).unwrap();

        assert!(result.is_some());
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let (header, payload_size) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());

        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.uri().host(), None);
        assert_eq!(header.uri().path(), "/index.html");
        assert_eq!(header.uri().query(), None);

        assert_eq!(header.headers().len(), 3);
        assert_eq!(header.headers().get(http::header::ACCEPT), Some(&HeaderValue::from_str("*/*").unwrap()));
        assert_eq!(header.headers().get(http::header::HOST), Some(&HeaderValue::from_str("127.0.0.1:8080").unwrap()));
        assert!(buf.is_empty());
    }

    #[test]
    fn crlf_and_leading_blank_lines() {
        let mut buf = BytesMut::from(&b"\r\n\r\nPUT /note.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello"[..]);

        let (header, payload_size) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.method(), &Method::PUT);
        assert_eq!(payload_size, PayloadSize::Length(5));
        assert_eq!(&buf[..], b"hello");
    }

    #[test]
    fn partial_head_waits() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: x\r\n"[..]);

        assert!(RequestHeaderDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 25);

        buf.extend_from_slice(b"\r\n");
        assert!(RequestHeaderDecoder.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn old_versions_are_decoded() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.0\r\n\r\n"[..]);
        let (header, _) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.version(), Version::HTTP_10);
    }

    #[test]
    fn malformed_request_line() {
        let mut buf = BytesMut::from(&b"GET /\r\n\r\n"[..]);
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::InvalidStartLine { .. })));

        let mut buf = BytesMut::from(&b"GET / FOO\r\n\r\n"[..]);
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::InvalidVersion { .. })));
    }

    #[test]
    fn header_without_colon_is_rejected() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost example.com\r\n\r\n"[..]);
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn unframed_post_is_an_error() {
        let mut buf = BytesMut::from(&b"POST /form HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::UnframedBody)));
    }

    #[test]
    fn unframed_post_of_old_version_has_no_body() {
        let mut buf = BytesMut::from(&b"POST /form HTTP/1.0\r\nHost: x\r\n\r\n"[..]);
        let (header, payload_size) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.version(), Version::HTTP_10);
        assert!(payload_size.is_empty());
    }

    #[test]
    fn content_length_wins_over_chunked() {
        let mut buf =
            BytesMut::from(&b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\nabc"[..]);
        let (_, payload_size) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(payload_size, PayloadSize::Length(3));
    }

    #[test]
    fn invalid_content_length() {
        let mut buf = BytesMut::from(&b"PUT / HTTP/1.1\r\nContent-Length: abc\r\n\r\n"[..]);
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn too_large_header() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\n"[..]);
        buf.extend_from_slice(format!("X-Long: {}\r\n", "a".repeat(MAX_HEADER_BYTES)).as_bytes());
        assert!(matches!(RequestHeaderDecoder.decode(&mut buf), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn status_line_with_collapsed_whitespace() {
        let mut buf = BytesMut::from(&b"HTTP/1.1   404    Not   Found\r\nContent-Length: 0\r\n\r\n"[..]);

        let (head, payload_size) = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.status(), StatusCode::NOT_FOUND);
        assert_eq!(head.extensions().get::<ReasonPhrase>().unwrap().as_str(), "Not Found");
        assert_eq!(payload_size, PayloadSize::Length(0));
    }

    #[test]
    fn chunked_response() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\nTransfer-Encoding: CHUNKED\n\n5\n"[..]);
        let (_, payload_size) = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
        assert!(payload_size.is_chunked());
        assert_eq!(&buf[..], b"5\n");
    }

    #[test]
    fn bodiless_responses_ignore_framing() {
        for status_line in ["HTTP/1.1 304 Not Modified", "HTTP/1.1 204 No Content", "HTTP/1.1 501 Not Implemented"] {
            let mut buf = BytesMut::from(format!("{status_line}\r\nContent-Length: 10\r\n\r\n").as_str());
            let (_, payload_size) = ResponseHeaderDecoder::default().decode(&mut buf).unwrap().unwrap();
            assert!(payload_size.is_empty(), "{status_line}");
        }

        let mut decoder = ResponseHeaderDecoder::default();
        decoder.expect_response_to(Method::HEAD);
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n"[..]);
        let (_, payload_size) = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(payload_size.is_empty());
    }

    #[test]
    fn unframed_response_is_an_error() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<h1>"[..]);
        assert!(matches!(ResponseHeaderDecoder::default().decode(&mut buf), Err(ParseError::UnframedBody)));
    }

    #[test]
    fn invalid_status_code() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 abc OK\r\n\r\n"[..]);
        assert!(matches!(ResponseHeaderDecoder::default().decode(&mut buf), Err(ParseError::InvalidStatus { .. })));

        let mut buf = BytesMut::from(&b"HTTP/1.1\r\n\r\n"[..]);
        assert!(matches!(ResponseHeaderDecoder::default().decode(&mut buf), Err(ParseError::InvalidStatus { .. })));
    }
}
