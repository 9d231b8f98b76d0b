use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// Writes body bytes for a message framed by `Content-Length`.
///
/// Writing more bytes than announced would corrupt the next message on the
/// connection, so an oversized chunk is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(mut bytes) => {
                if !bytes.has_remaining() {
                    return Ok(());
                }
                let remaining = bytes.remaining() as u64;
                if remaining > self.length {
                    return Err(SendError::invalid_body(format!(
                        "{remaining} bytes given but only {} left of content-length",
                        self.length
                    )));
                }
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                self.length -= remaining;
                Ok(())
            }
            PayloadItem::Eof => {
                if self.length != 0 {
                    warn!(missing = self.length, "payload finished before content-length was reached");
                }
                Ok(())
            }
        }
    }
}
