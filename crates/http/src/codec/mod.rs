//! HTTP/1.1 codecs for both sides of a connection.
//!
//! Every decoder works on a shared, reusable byte stream: it consumes exactly the
//! bytes of one message and leaves whatever follows for the next one.
//!
//! - Lines: [`next_line`] and [`LineDecoder`] read CRLF or bare-LF terminated lines
//! - Requests: [`RequestDecoder`] on the server, [`RequestEncoder`] on the client
//! - Responses: [`ResponseEncoder`] on the server, [`ResponseDecoder`] on the client
//!
//! Message bodies are decoded from either `Content-Length` or chunked framing and
//! always encoded with `Content-Length`.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use ferry_http::codec::RequestDecoder;
//! use ferry_http::protocol::Message;
//! use tokio_util::codec::Decoder;
//!
//! let mut buffer = BytesMut::from(&b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//! let mut decoder = RequestDecoder::new();
//! let Some(Message::Header((header, _))) = decoder.decode(&mut buffer).unwrap() else {
//!     panic!("expected a request head");
//! };
//! assert_eq!(header.uri().path(), "/index.html");
//! ```

mod body;
mod header;
mod line;
mod message_decoder;
mod message_encoder;

pub use line::LineDecoder;
pub use line::next_line;
pub use message_decoder::MessageDecoder;
pub use message_decoder::RequestDecoder;
pub use message_decoder::ResponseDecoder;
pub use message_encoder::MessageEncoder;
pub use message_encoder::RequestEncoder;
pub use message_encoder::ResponseEncoder;
