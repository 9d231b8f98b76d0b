//! Line reading shared by start-lines, header fields and chunk-size lines.
//!
//! A line ends at `\n`. A `\r` right before it is dropped, so both CRLF and bare LF
//! terminators are accepted, and the resulting text is trimmed. An empty string is
//! a real line: it is the blank line that closes a header block.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::protocol::ParseError;

/// Returns the index just past the next `\n` in `src`, if there is one.
#[inline]
pub(crate) fn find_line_end(src: &[u8]) -> Option<usize> {
    src.iter().position(|b| *b == b'\n').map(|index| index + 1)
}

/// Converts the raw bytes of one line, terminator included, into trimmed text.
#[inline]
pub(crate) fn line_text(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Returns true if the raw line holds nothing but whitespace.
#[inline]
pub(crate) fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

/// Takes the next complete line off the front of `src`.
///
/// Returns `None` without consuming anything while no `\n` has arrived yet.
pub fn next_line(src: &mut BytesMut) -> Option<String> {
    let end = find_line_end(src)?;
    let raw = src.split_to(end);
    Some(line_text(&raw))
}

/// Drops blank lines sitting in front of a start-line.
pub(crate) fn skip_blank_lines(src: &mut BytesMut) {
    while let Some(end) = find_line_end(src) {
        if !is_blank(&src[..end]) {
            return;
        }
        src.advance(end);
    }
}

/// A standalone line decoder for use with `FramedRead`.
///
/// The stream ends (`None`) when the reader closes; bytes left over without a
/// terminating `\n` are discarded, as a line is only complete once `\n` is seen.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDecoder;

impl Decoder for LineDecoder {
    type Item = String;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(next_line(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                src.clear();
                Ok(None)
            }
        }
    }
}
