//! Streaming encoders for whole HTTP messages.
//!
//! An encoder takes one `Message::Header` with its [`PayloadSize`], then payload
//! items up to `Eof`. The head is written by [`HeaderEncoder`] and the body by a
//! [`PayloadEncoder`] matching the announced size.

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadSize, RequestHeader, ResponseHead, SendError};
use bytes::{Buf, BytesMut};
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

/// Encodes responses on the server side.
pub type ResponseEncoder = MessageEncoder<ResponseHead>;

/// Encodes requests on the client side.
pub type RequestEncoder = MessageEncoder<RequestHeader>;

#[derive(Debug)]
pub struct MessageEncoder<H> {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
    _head: std::marker::PhantomData<fn(H)>,
}

impl<H> MessageEncoder<H> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<H> Default for MessageEncoder<H> {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, payload_encoder: None, _head: std::marker::PhantomData }
    }
}

impl<H, D: Buf> Encoder<Message<(H, PayloadSize), D>> for MessageEncoder<H>
where
    HeaderEncoder: Encoder<(H, PayloadSize), Error = SendError>,
{
    type Error = SendError;

    fn encode(&mut self, item: Message<(H, PayloadSize), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive message head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                let payload_encoder = PayloadEncoder::try_from(payload_size)?;
                self.header_encoder.encode((head, payload_size), dst)?;
                self.payload_encoder = Some(payload_encoder);
                Ok(())
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect message head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let is_eof = payload_item.is_eof();
                let result = payload_encoder.encode(payload_item, dst);

                // Eof always ends the message, even when the body was suppressed
                if is_eof {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}
