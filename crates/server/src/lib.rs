//! A file server built on [`ferry_http`].
//!
//! The server serves one directory tree. GET and HEAD read files (honouring
//! `If-Modified-Since`), PUT replaces a file, and any other method appends to
//! an existing one.
//!
//! ```no_run
//! use ferry_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().root("files/example.com").address("127.0.0.1:8000").build()?;
//!     Server::bind(config).await?.serve().await;
//!     Ok(())
//! }
//! ```

pub mod conditional;
pub mod config;
pub mod date;
pub mod handler;
pub mod media_type;
pub mod server;
pub mod store;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use handler::FileHandler;
pub use server::{Server, ServerError};
pub use store::{Resource, ResourceStore, StoreError};
