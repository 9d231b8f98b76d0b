//! HTTP/1.1 message framing and connection lifecycle over raw sockets.
//!
//! This crate implements both sides of an HTTP/1.1 conversation on top of tokio:
//! a server connection that reads requests and writes responses, and a client
//! connection that writes requests, reads responses and follows redirects. The
//! focus is on deciding, byte by byte, where each message starts and ends on a
//! reused socket:
//!
//! - Lines end at `\n`, with or without a preceding `\r`
//! - Bodies are framed by `Content-Length` or chunked transfer encoding; a body
//!   that must exist but has neither is an error, never an empty body
//! - Bodies are always sent with `Content-Length`
//! - Connections are kept alive until a side says `Connection: close`, the peer
//!   speaks another version than HTTP/1.1, or a message cannot be decoded
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::convert::Infallible;
//!
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use tokio::net::TcpListener;
//! use tracing::{error, info, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use ferry_http::connection::HttpConnection;
//! use ferry_http::handler::make_handler;
//! use ferry_http::protocol::Payload;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 error!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!(cause = %e, "process connection error");
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Option<Bytes>>) -> Result<Response<Option<Payload>>, Infallible> {
//!     info!(path = %request.uri().path(), "request");
//!     Ok(Response::new(Some(Payload::text("Hello World!\r\n"))))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: message types, header table, payloads and errors
//! - [`codec`]: line reader, header and body codecs, message decoders/encoders
//! - [`connection`]: server and client connection lifecycles
//! - [`client`]: client bound to one server, redirect following
//! - [`handler`]: request handler trait for the server side
//!
//! # Limitations
//!
//! - No pipelining: one exchange at a time per connection
//! - No TLS
//! - Duplicate header fields keep only their last value
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
