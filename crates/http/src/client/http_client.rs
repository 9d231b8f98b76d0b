use bytes::Bytes;
use http::{Method, Response};
use tracing::{debug, info};

use crate::client::{ClientConfig, RedirectResolver};
use crate::connection::TcpClientConnection;
use crate::protocol::{HttpError, ParseError, Payload, SendError};

/// A client bound to one server.
///
/// Requests reuse one persistent connection for as long as the server keeps it
/// open; once it is no longer persistent the next request connects again.
/// A GET or HEAD that fails on a reused connection because the server has
/// dropped it in the meantime is sent once more on a new connection.
/// Responses that redirect are followed through a [`RedirectResolver`].
#[derive(Debug)]
pub struct HttpClient {
    host: String,
    port: u16,
    config: ClientConfig,
    resolver: RedirectResolver,
    connection: Option<TcpClientConnection>,
}

impl HttpClient {
    pub fn new<S: Into<String>>(host: S, port: u16, config: ClientConfig) -> Self {
        let resolver = RedirectResolver::new(config.max_redirects(), config.read_timeout());
        Self { host: host.into(), port, config, resolver, connection: None }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Sends a request and returns the final response after redirects.
    pub async fn send_request(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
    ) -> Result<Response<Option<Bytes>>, HttpError> {
        let reused = self.connection.as_ref().is_some_and(TcpClientConnection::is_persistent);
        let retry_payload = if reused && is_idempotent(&method) { Some(payload.clone()) } else { None };

        let response = match self.exchange(method.clone(), path, payload).await {
            Ok(response) => response,
            Err(e) if is_dropped_connection(&e) => match retry_payload {
                Some(payload) => {
                    info!(cause = %e, method = %method, path = %path, "reused connection was closed by the server, retrying");
                    self.exchange(method.clone(), path, payload).await?
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };

        Ok(self.resolver.resolve(response, &method, (self.host.as_str(), self.port)).await)
    }

    /// Sends one request on the cached connection, connecting first when there
    /// is none. The connection is cached again while it stays persistent.
    async fn exchange(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
    ) -> Result<Response<Option<Bytes>>, HttpError> {
        let mut connection = match self.connection.take() {
            Some(connection) if connection.is_persistent() => connection,
            _ => {
                debug!(host = %self.host, port = self.port, "opening new connection");
                TcpClientConnection::connect(&self.host, self.port)
                    .await?
                    .with_read_timeout(self.config.read_timeout())
            }
        };

        let response = connection.send_request(method, path, payload).await?;
        if connection.is_persistent() {
            self.connection = Some(connection);
        }
        Ok(response)
    }

    pub async fn get(&mut self, path: &str) -> Result<Response<Option<Bytes>>, HttpError> {
        self.send_request(Method::GET, path, None).await
    }

    pub async fn head(&mut self, path: &str) -> Result<Response<Option<Bytes>>, HttpError> {
        self.send_request(Method::HEAD, path, None).await
    }

    pub async fn put(&mut self, path: &str, payload: Payload) -> Result<Response<Option<Bytes>>, HttpError> {
        self.send_request(Method::PUT, path, Some(payload)).await
    }

    pub async fn post(&mut self, path: &str, payload: Payload) -> Result<Response<Option<Bytes>>, HttpError> {
        self.send_request(Method::POST, path, Some(payload)).await
    }
}

fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Whether `e` means the peer went away under the request, as opposed to a
/// malformed or slow response.
fn is_dropped_connection(e: &HttpError) -> bool {
    matches!(
        e,
        HttpError::ConnectionClosed
            | HttpError::Send { source: SendError::Io { .. } }
            | HttpError::Parse { source: ParseError::Io { .. } | ParseError::TruncatedHeader }
    )
}
