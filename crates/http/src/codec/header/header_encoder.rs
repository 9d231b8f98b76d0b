//! Header encoders for responses and requests.
//!
//! Both heads are always written as HTTP/1.1. Header names are emitted in their
//! canonical capitalization (`content-type` becomes `Content-Type`), and the
//! framing headers are derived from the [`PayloadSize`] rather than copied from
//! the head: bodies are framed by `Content-Length` only and any
//! `Transfer-Encoding` on the head is dropped.

use crate::protocol::{PayloadSize, ReasonPhrase, RequestHeader, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::{HeaderMap, HeaderValue, header};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for response and request heads implementing the [`Encoder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    /// Writes the status line and header block of a response.
    ///
    /// A response without payload announces `Content-Length: 0` unless the head
    /// already carries a `Content-Length`, which is how the length of a body that
    /// is suppressed (HEAD, 304) is still reported.
    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);
        let reason = match head.extensions().get::<ReasonPhrase>() {
            Some(reason) => reason.as_str(),
            None => head.status().canonical_reason().unwrap_or("Unknown"),
        };
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", head.status().as_str(), reason)?;

        match payload_size {
            PayloadSize::Length(n) => {
                head.headers_mut().insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Empty => {
                const ZERO_VALUE: HeaderValue = HeaderValue::from_static("0");
                head.headers_mut().entry(header::CONTENT_LENGTH).or_insert(ZERO_VALUE);
            }
            PayloadSize::Chunked => return Err(SendError::invalid_body("chunked responses are never sent")),
        }

        write_headers(head.headers_mut(), dst);
        Ok(())
    }
}

impl Encoder<(RequestHeader, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    /// Writes the request line and header block of a request.
    ///
    /// The request target is the path and query of the head's URI. A request
    /// without payload carries no framing headers at all.
    fn encode(&mut self, item: (RequestHeader, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut request, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);
        let target = request.uri().path_and_query().map(|path| path.as_str()).unwrap_or("/");
        write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", request.method(), target)?;

        match payload_size {
            PayloadSize::Length(n) => {
                request.headers_mut().insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Empty => {}
            PayloadSize::Chunked => return Err(SendError::invalid_body("chunked requests are never sent")),
        }

        write_headers(request.headers_mut(), dst);
        Ok(())
    }
}

fn write_headers(headers: &mut HeaderMap, dst: &mut BytesMut) {
    headers.remove(header::TRANSFER_ENCODING);

    for (header_name, header_value) in headers.iter() {
        put_canonical_name(header_name.as_str(), dst);
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
}

/// Upper-cases the first letter of the name and every letter following a `-`.
fn put_canonical_name(name: &str, dst: &mut BytesMut) {
    let mut upper = true;
    for b in name.bytes() {
        dst.put_u8(if upper { b.to_ascii_uppercase() } else { b });
        upper = b == b'-';
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
