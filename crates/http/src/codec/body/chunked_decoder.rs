//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! Each chunk is a size line in hex (extensions after `;` are ignored), the chunk
//! data, and a line terminator. A chunk of size zero ends the body; trailer fields
//! that may follow it are skipped up to the closing blank line.
//!
//! Size lines go through the same line reader as headers, so CRLF and bare LF are
//! both accepted there. After chunk data one byte is read; when it is not `\n` it
//! is taken to be the `\r` of a CRLF and one more byte is consumed.

use crate::codec::line::next_line;
use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, Bytes, BytesMut};
use std::task::Poll;
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::{Body, BodyEnd, BodyLf, End, Size, Trailer};

/// A decoder for handling HTTP chunked transfer encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder, ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line
    Size,
    /// Read chunk data
    Body,
    /// Read the first byte of the terminator after chunk data
    BodyEnd,
    /// Read the LF of a CRLF after chunk data
    BodyLf,
    /// Skip trailer fields after the last chunk
    Trailer,
    /// Final state after reading last chunk
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes chunked transfer encoded data from the input buffer.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when chunk data is available
    /// - `Ok(Some(PayloadItem::Eof))` when the zero-size chunk has been processed
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if a chunk size line is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            let mut buf = None;

            self.state = match self.state.step(src, &mut self.remaining_size, &mut buf) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = buf {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }

    /// A peer that closes right after the zero-size line has still delivered the
    /// whole body; closing anywhere else truncates it.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        match self.state {
            Trailer if src.is_empty() => {
                self.state = End;
                Ok(Some(PayloadItem::Eof))
            }
            Body => Err(ParseError::truncated_body(format!("{} bytes of the current chunk missing", self.remaining_size))),
            _ => Err(ParseError::truncated_body("stream closed before the last chunk")),
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.len() > 0 {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

impl ChunkedState {
    fn step(
        &self,
        src: &mut BytesMut,
        remaining_size: &mut u64,
        buf: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            Size => ChunkedState::read_size(src, remaining_size),
            Body => ChunkedState::read_body(src, remaining_size, buf),
            BodyEnd => ChunkedState::read_body_end(src),
            BodyLf => ChunkedState::read_body_lf(src),
            Trailer => ChunkedState::read_trailer(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Reads a whole size line and parses its hex size.
    ///
    /// # State Transitions
    /// - size 0: move to Trailer, the body is complete
    /// - size > 0: move to Body to read the chunk data
    fn read_size(src: &mut BytesMut, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        let Some(line) = next_line(src) else {
            return Poll::Pending;
        };

        let size = line.split(';').next().unwrap_or_default().trim();
        if size.is_empty() {
            return Poll::Ready(Err(ParseError::invalid_chunk_size(format!("missing size in {line:?}"))));
        }

        *size_per_chunk = match u64::from_str_radix(size, 16) {
            Ok(size) => size,
            Err(e) => return Poll::Ready(Err(ParseError::invalid_chunk_size(format!("{size:?}: {e}")))),
        };

        if *size_per_chunk == 0 { Poll::Ready(Ok(Trailer)) } else { Poll::Ready(Ok(Body)) }
    }

    /// Reads up to `size_per_chunk` bytes of chunk data from the buffer.
    fn read_body(
        src: &mut BytesMut,
        size_per_chunk: &mut u64,
        buf: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Pending;
        }

        #[allow(clippy::cast_possible_truncation, reason = "clamped to src.len() below")]
        let slice_len = (*size_per_chunk).min(src.len() as u64) as usize;

        *buf = Some(src.split_to(slice_len).freeze());
        *size_per_chunk -= slice_len as u64;

        if *size_per_chunk > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyEnd)) }
    }

    /// A lone `\n` completes the terminator, anything else is the `\r` of CRLF.
    fn read_body_end(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(Size)),
            _ => Poll::Ready(Ok(BodyLf)),
        }
    }

    fn read_body_lf(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        let _lf = try_next_byte!(src);
        Poll::Ready(Ok(Size))
    }

    /// Skips trailer fields until the blank line that closes the body.
    fn read_trailer(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match next_line(src) {
            None => Poll::Pending,
            Some(line) if line.is_empty() => Poll::Ready(Ok(End)),
            Some(line) => {
                trace!(trailer = %line, "skip chunked trailer field");
                Poll::Ready(Ok(Trailer))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> Vec<u8> {
        let mut body = Vec::new();
        loop {
            match decoder.decode(buffer).unwrap().unwrap() {
                PayloadItem::Chunk(bytes) => body.extend_from_slice(&bytes),
                PayloadItem::Eof => return body,
            }
        }
    }

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"10\r\n1234567890abcdef\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();
        {
            let item = decoder.decode(&mut buffer).unwrap().unwrap();
            assert!(item.is_chunk());
            assert_eq!(item.as_bytes().unwrap().len(), 16);

            let str = std::str::from_utf8(&item.as_bytes().unwrap()[..]).unwrap();
            assert_eq!(str, "1234567890abcdef");
        }

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b", world"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn stops_exactly_at_zero_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"3\r\nabc\r\n1A\r\nabcdefghijklmnopqrstuvwxyz\r\n0\r\n\r\nHTTP/1.1 200 OK\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decode_all(&mut decoder, &mut buffer), b"abcabcdefghijklmnopqrstuvwxyz");
        assert_eq!(&buffer[..], b"HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn bare_lf_terminators() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\nhello\n6\n world\n0\n\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decode_all(&mut decoder, &mut buffer), b"hello world");
        assert!(buffer.is_empty());
    }

    #[test]
    fn chunk_data_may_contain_line_breaks() {
        let mut buffer: BytesMut = BytesMut::from(&b"4\r\n\r\n\r\n\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decode_all(&mut decoder, &mut buffer), b"\r\n\r\n");
    }

    #[test]
    fn test_chunks_with_extensions() {
        let mut buffer: BytesMut = BytesMut::from(&b"5;chunk-ext=value\r\nhello\r\n0;last\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hello"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_chunks_with_trailers() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n0\r\nTrailer: value\r\n\r\nnext"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decode_all(&mut decoder, &mut buffer), b"hello");
        assert_eq!(&buffer[..], b"next");
    }

    #[test]
    fn test_incomplete_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap();
        assert_eq!(chunk.unwrap().as_bytes().unwrap(), &Bytes::copy_from_slice(b"hel"));

        buffer.extend_from_slice(b"lo\r\n0\r\n\r\n");

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"lo"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn partial_size_line_waits() {
        let mut buffer: BytesMut = BytesMut::from(&b"1"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        buffer.extend_from_slice(b"0\r\n0123456789abcdef\r\n0\r\n\r\n");
        assert_eq!(decode_all(&mut decoder, &mut buffer), b"0123456789abcdef");
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut buffer: BytesMut = BytesMut::from(&b"xyz\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let result = decoder.decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::InvalidChunkSize { .. })));
    }

    #[test]
    fn truncated_inside_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"a\r\nhello"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(ParseError::TruncatedBody { .. })));
    }

    #[test]
    fn close_after_zero_size_line_is_accepted() {
        let mut buffer: BytesMut = BytesMut::from(&b"2\r\nhi\r\n0\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_large_chunk() {
        // Create a large chunk (1MB)
        let size = 1024 * 1024;
        let mut data = Vec::with_capacity(size + 16);
        data.extend(format!("{size:x}\r\n").into_bytes());
        data.extend(vec![b'A'; size]);
        data.extend(b"\r\n0\r\n\r\n");

        let mut buffer = BytesMut::from(&data[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap().len(), size);
        assert!(chunk.as_bytes().unwrap().iter().all(|&b| b == b'A'));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_zero_size_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }
}
