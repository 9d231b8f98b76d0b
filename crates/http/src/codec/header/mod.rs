//! HTTP header processing for both sides of a connection.
//!
//! - [`RequestHeaderDecoder`] and [`ResponseHeaderDecoder`]: parse a start line and
//!   header block and decide how the body that follows is framed
//! - [`HeaderEncoder`]: writes request and response heads, deriving the framing
//!   headers from the payload size

mod header_decoder;
mod header_encoder;

pub use header_decoder::RequestHeaderDecoder;
pub use header_decoder::ResponseHeaderDecoder;
pub use header_encoder::HeaderEncoder;
