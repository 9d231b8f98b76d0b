//! Streaming decoders for whole HTTP messages.
//!
//! A message is decoded in two phases. The header decoder parses the start line and
//! header block and reports how the body is framed; a [`PayloadDecoder`] for that
//! framing then hands out the body as payload items until `Eof`, after which the
//! decoder is ready for the next message on the same connection.
//!
//! - [`RequestDecoder`]: server side, decodes requests
//! - [`ResponseDecoder`]: client side, decodes responses

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{RequestHeaderDecoder, ResponseHeaderDecoder};
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize};
use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;

/// Decodes requests: `Message::Header((RequestHeader, PayloadSize))` followed by payload items.
pub type RequestDecoder = MessageDecoder<RequestHeaderDecoder>;

/// Decodes responses: `Message::Header((ResponseHead, PayloadSize))` followed by payload items.
pub type ResponseDecoder = MessageDecoder<ResponseHeaderDecoder>;

/// A decoder for HTTP messages that handles both headers and payload
///
/// # State Machine
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug, Default)]
pub struct MessageDecoder<H> {
    header_decoder: H,
    payload_decoder: Option<PayloadDecoder>,
}

impl<H: Default> MessageDecoder<H> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<H> MessageDecoder<H> {
    /// Returns true while the body of the last decoded head has not been fully read.
    pub fn in_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl MessageDecoder<ResponseHeaderDecoder> {
    /// Sets the method of the request the next response answers; a response to
    /// HEAD never has body bytes.
    pub fn expect_response_to(&mut self, method: Method) {
        self.header_decoder.expect_response_to(method);
    }
}

impl<H, T> Decoder for MessageDecoder<H>
where
    H: Decoder<Item = (T, PayloadSize), Error = ParseError>,
{
    type Item = Message<(T, PayloadSize)>;
    type Error = ParseError;

    /// Attempts to decode the next item of a message from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: Successfully decoded a message head
    /// - `Ok(Some(Message::Payload(_)))`: Successfully decoded a payload chunk or the end of the body
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // parse payload if have payload_decoder
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            return Ok(self.payload_message(item));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    /// Called once the peer has closed its side.
    ///
    /// Inside a body this fails unless the framing says the body is complete.
    /// Between messages only whitespace may be left over; a partial head is
    /// reported as truncated.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            return Ok(self.payload_message(item));
        }

        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        if src.iter().all(u8::is_ascii_whitespace) {
            src.clear();
            Ok(None)
        } else {
            Err(ParseError::TruncatedHeader)
        }
    }
}

impl<H> MessageDecoder<H> {
    fn payload_message<T>(&mut self, item: Option<PayloadItem>) -> Option<Message<T>> {
        match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ PayloadItem::Eof) => {
                // this message is complete, the next bytes start a new head
                self.payload_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        }
    }
}
