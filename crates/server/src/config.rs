use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Settings of one server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    root: PathBuf,
    address: Vec<SocketAddr>,
    idle_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Directory every request path is resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// How long a connection may sit between requests before it is dropped.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}

#[derive(Debug)]
pub struct ServerConfigBuilder {
    root: Option<PathBuf>,
    address: Option<Result<Vec<SocketAddr>, ConfigError>>,
    idle_timeout: Option<Duration>,
}

impl ServerConfigBuilder {
    fn new() -> Self {
        Self { root: None, address: None, idle_timeout: None }
    }

    pub fn root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn address<A: ToSocketAddrs + ToString>(mut self, address: A) -> Self {
        let resolved = address
            .to_socket_addrs()
            .map(|addresses| addresses.collect::<Vec<_>>())
            .map_err(|source| ConfigError::InvalidAddress { address: address.to_string(), source });
        self.address = Some(resolved);
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let root = self.root.ok_or(ConfigError::MissingRoot)?;
        if !root.is_dir() {
            return Err(ConfigError::RootNotADirectory { root });
        }

        let address = self.address.ok_or(ConfigError::MissingAddress)??;
        if address.is_empty() {
            return Err(ConfigError::MissingAddress);
        }

        Ok(ServerConfig { root, address, idle_timeout: self.idle_timeout })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("root directory must be set")]
    MissingRoot,

    #[error("root {root:?} is not a directory")]
    RootNotADirectory { root: PathBuf },

    #[error("address must be set")]
    MissingAddress,

    #[error("can't resolve address {address}: {source}")]
    InvalidAddress { address: String, source: std::io::Error },
}
