//! Core HTTP protocol types.
//!
//! - **Message handling** ([`message`]): the header/payload item stream produced by
//!   decoders and consumed by encoders, and the [`PayloadCollector`] that turns
//!   payload items back into one body.
//! - **Headers** ([`header`]): the case-insensitive [`HeaderTable`] and the
//!   `name: value` line parser.
//! - **Requests** ([`request`]) and **responses** ([`response`]): head types, version
//!   tokens, path escaping, default status pages.
//! - **Payloads** ([`payload`]): a materialized body with its media type.
//! - **Errors** ([`error`]): [`HttpError`], [`ParseError`] and [`SendError`].

mod message;
pub use message::Message;
pub use message::PayloadCollector;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod header;
pub use header::HeaderTable;
pub use header::header_str;
pub use header::parse_header;
pub use header::wants_close;

mod request;
pub use request::RequestHeader;
pub use request::escape_path;
pub use request::parse_version;
pub use request::unescape_path;

mod response;
pub use response::ReasonPhrase;
pub use response::ResponseHead;
pub use response::is_bodiless_status;
pub use response::status_page;
pub use response::status_response;

mod payload;
pub use payload::Payload;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
