//! HTTP body handling for request and response payloads.
//!
//! # Decoders
//! - [`PayloadDecoder`]: picks the strategy for one message body
//!   - `LengthDecoder`: exactly `Content-Length` bytes
//!   - `ChunkedDecoder`: `Transfer-Encoding: chunked`, including trailer skipping
//!
//! # Encoders
//! - [`PayloadEncoder`]: writes bodies with `Content-Length` framing only

mod chunked_decoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
