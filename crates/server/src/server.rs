use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use ferry_http::connection::HttpConnection;

use crate::config::ServerConfig;
use crate::handler::FileHandler;
use crate::store::ResourceStore;

/// A bound file server.
///
/// Every accepted connection is served by its own task; requests on one
/// connection are answered in order.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't bind {address:?}: {source}")]
    Bind { address: Vec<SocketAddr>, source: std::io::Error },

    #[error("can't read the local address: {source}")]
    LocalAddr { source: std::io::Error },
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.address())
            .await
            .map_err(|source| ServerError::Bind { address: config.address().to_vec(), source })?;

        info!(address = ?config.address(), root = ?config.root(), "start listening");
        Ok(Self { config, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|source| ServerError::LocalAddr { source })
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve(self) {
        let handler = Arc::new(FileHandler::new(ResourceStore::new(self.config.root())));
        let idle_timeout = self.config.idle_timeout();

        loop {
            let (tcp_stream, remote_addr) = match self.listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer).with_idle_timeout(idle_timeout);
                match connection.process(handler).await {
                    Ok(()) => {
                        info!(remote = %remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(remote = %remote_addr, "service has error, cause {}, connection shutdown", e);
                    }
                }
            });
        }
    }
}
