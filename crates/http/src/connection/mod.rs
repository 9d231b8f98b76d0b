//! Connection lifecycle for both roles.
//!
//! A connection owns one socket and carries a sequence of request/response
//! exchanges over it, strictly one at a time and in order. Each exchange reads a
//! complete message through the codecs before the next one starts, so the byte
//! stream never gets out of step between messages.
//!
//! - [`HttpConnection`]: server side, reads requests and writes responses until
//!   the peer closes, a request asks to close, or a request cannot be decoded
//! - [`ClientConnection`]: client side, writes a request and reads its response,
//!   tracking whether the connection may be reused

mod client_connection;
mod http_connection;

pub use client_connection::ClientConnection;
pub use client_connection::TcpClientConnection;
pub use http_connection::HttpConnection;
