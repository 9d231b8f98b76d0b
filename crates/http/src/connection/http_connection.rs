use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST};
use http::{HeaderValue, Method, Request, Response, StatusCode, Version};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{
    HttpError, Message, Payload, PayloadCollector, PayloadItem, PayloadSize, RequestHeader, SendError,
    is_bodiless_status, status_response, wants_close,
};

/// The server side of one HTTP/1.1 connection.
///
/// `HttpConnection` owns the socket halves for the whole lifetime of the
/// connection and serves requests one after the other:
/// - read one request head and its complete body
/// - answer protocol problems itself (400, 501) or hand the request to the handler
/// - write the response, then either wait for the next request or close
///
/// The connection closes after a response when the request asked for
/// `Connection: close`, when the request was not HTTP/1.1, when a request could
/// not be decoded, and when the peer closes its side.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    idle_timeout: Option<Duration>,
}

/// What to do with the connection once a response has been written.
enum Next {
    KeepAlive,
    Close,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            idle_timeout: None,
        }
    }

    /// Closes the connection when no request arrives within `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            let (header, body) = match self.read_request().await {
                Ok(Some(request)) => request,

                Ok(None) => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }

                Err(HttpError::Timeout) => {
                    info!(timeout = ?self.idle_timeout, "connection idle for too long, closing it");
                    return Ok(());
                }

                Err(HttpError::Parse { source }) => {
                    error!(cause = %source, "can't receive next request");
                    self.send_response(&Method::GET, status_response(StatusCode::BAD_REQUEST)).await?;
                    return Err(source.into());
                }

                Err(e) => return Err(e),
            };

            match self.do_process(header, body, &handler).await? {
                Next::KeepAlive => continue,
                Next::Close => {
                    info!("closing connection after response");
                    return Ok(());
                }
            }
        }
    }

    async fn do_process<H>(&mut self, header: RequestHeader, body: Option<Bytes>, handler: &Arc<H>) -> Result<Next, HttpError>
    where
        H: Handler,
    {
        let method = header.method().clone();
        let close = wants_close(header.headers());

        if header.version() != Version::HTTP_11 {
            warn!(http_version = ?header.version(), "unsupported http version");
            self.send_response(&method, status_response(StatusCode::NOT_IMPLEMENTED)).await?;
            return Ok(Next::Close);
        }

        if !header.headers().contains_key(HOST) {
            warn!(uri = %header.uri(), "request without host header");
            self.send_response(&method, status_response(StatusCode::BAD_REQUEST)).await?;
            return Ok(if close { Next::Close } else { Next::KeepAlive });
        }

        info!(method = %method, uri = %header.uri(), "received request");
        let request: Request<Option<Bytes>> = header.body(body);

        let response = match handler.call(request).await {
            Ok(response) => response,
            Err(e) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handle request error");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        self.send_response(&method, response).await?;

        Ok(if close { Next::Close } else { Next::KeepAlive })
    }

    /// Reads the next request head and its whole body.
    ///
    /// Returns `Ok(None)` when the peer closed the connection between requests.
    async fn read_request(&mut self) -> Result<Option<(RequestHeader, Option<Bytes>)>, HttpError> {
        let (header, payload_size) = match self.next_message().await? {
            Some(Message::Header(header)) => header,
            Some(Message::Payload(_)) => {
                error!("receive payload item while waiting for a request head");
                return Err(HttpError::ConnectionClosed);
            }
            None => return Ok(None),
        };

        let mut collector = PayloadCollector::new();
        loop {
            match self.next_message().await? {
                Some(Message::Payload(PayloadItem::Chunk(bytes))) => collector.push(&bytes),
                Some(Message::Payload(PayloadItem::Eof)) => break,
                Some(Message::Header(_)) | None => return Err(HttpError::ConnectionClosed),
            }
        }

        let body = match payload_size {
            PayloadSize::Empty => None,
            PayloadSize::Length(_) | PayloadSize::Chunked => Some(collector.finish()),
        };

        Ok(Some((header, body)))
    }

    async fn next_message(&mut self) -> Result<Option<Message<(RequestHeader, PayloadSize)>>, HttpError> {
        let next = match self.idle_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.framed_read.next()).await.map_err(|_| HttpError::Timeout)?,
            None => self.framed_read.next().await,
        };

        Ok(next.transpose()?)
    }

    /// Writes one response, framed by `Content-Length`.
    ///
    /// Every response gets a `Date` header, and a payload sets `Content-Type`.
    /// Responses to HEAD and bodiless statuses announce the length of their
    /// payload but never write its bytes.
    async fn send_response(&mut self, method: &Method, response: Response<Option<Payload>>) -> Result<(), HttpError> {
        let (mut parts, payload) = response.into_parts();

        let mut date = faf_http_date::get_date_buff_no_key();
        faf_http_date::get_date_no_key(&mut date);
        let date = HeaderValue::from_bytes(&date[..]).map_err(|_| SendError::invalid_body("invalid date header"))?;
        parts.headers.insert(DATE, date);

        let suppress_body = *method == Method::HEAD || is_bodiless_status(parts.status);

        let (payload_size, body) = match payload {
            Some(payload) => {
                let content_type = HeaderValue::from_str(payload.content_type().as_ref())
                    .map_err(|_| SendError::invalid_body("invalid content type"))?;
                parts.headers.insert(CONTENT_TYPE, content_type);

                if suppress_body {
                    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(payload.len() as u64));
                    (PayloadSize::new_empty(), None)
                } else {
                    (PayloadSize::new_length(payload.len() as u64), Some(payload.into_bytes()))
                }
            }
            None => (PayloadSize::new_empty(), None),
        };

        let status = parts.status;
        let header = Message::<_, Bytes>::Header((Response::from_parts(parts, ()), payload_size));
        self.framed_write.feed(header).await?;

        if let Some(body) = body {
            self.framed_write.feed(Message::Payload(PayloadItem::Chunk(body))).await?;
        }

        // send instead of feed, the whole response must reach the peer now
        self.framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await?;
        info!(status = %status, "sent response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use std::convert::Infallible;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    async fn echo(request: Request<Option<Bytes>>) -> Result<Response<Option<Payload>>, Infallible> {
        let text = match request.body() {
            Some(body) => format!("{} {}", request.uri().path(), String::from_utf8_lossy(body)),
            None => request.uri().path().to_string(),
        };
        Ok(Response::new(Some(Payload::text(text))))
    }

    async fn exchange(input: &[u8]) -> String {
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let connection = HttpConnection::new(server_read, server_write);
        let task = tokio::spawn(connection.process(Arc::new(make_handler(echo))));

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = Vec::new();
        client_read.read_to_end(&mut output).await.unwrap();
        let _ = task.await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn keep_alive_serves_requests_in_order() {
        let output = exchange(b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nPUT /b HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nhi").await;

        let first = output.find("\r\n\r\n/a").unwrap();
        let second = output.find("\r\n\r\n/b hi").unwrap();
        assert!(first < second);
        assert_eq!(output.matches("HTTP/1.1 200 OK\r\n").count(), 2);
        assert!(output.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(output.contains("Date: "));
    }

    #[tokio::test]
    async fn chunked_request_body() {
        let output =
            exchange(b"POST /c HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nab\r\n1\r\nc\r\n0\r\n\r\n").await;
        assert!(output.ends_with("Content-Length: 6\r\n\r\n/c abc"));
    }

    #[tokio::test]
    async fn old_version_gets_501_and_close() {
        let output = exchange(b"GET / HTTP/1.0\r\n\r\nGET /never HTTP/1.1\r\nHost: x\r\n\r\n").await;

        assert!(output.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
        assert!(!output.contains("/never"));
    }

    #[tokio::test]
    async fn old_version_post_without_length_gets_501() {
        let output = exchange(b"POST /form HTTP/1.0\r\nHost: x\r\n\r\nname=value").await;

        assert!(output.starts_with("HTTP/1.1 501 Not Implemented\r\n"), "{output}");
        assert_eq!(output.matches("HTTP/1.1").count(), 1);
    }

    #[tokio::test]
    async fn missing_host_keeps_connection_open() {
        let output = exchange(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\nHost: x\r\n\r\n").await;

        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(output.contains("HTTP/1.1 200 OK\r\n"));
        assert!(output.ends_with("/b"));
    }

    #[tokio::test]
    async fn connection_close_stops_after_response() {
        let output =
            exchange(b"GET /a HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\nGET /b HTTP/1.1\r\nHost: x\r\n\r\n").await;

        assert_eq!(output.matches("HTTP/1.1 200 OK").count(), 1);
        assert!(output.ends_with("/a"));
    }

    #[tokio::test]
    async fn unframed_put_is_rejected() {
        let output = exchange(b"PUT /a HTTP/1.1\r\nHost: x\r\n\r\nhello").await;

        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert_eq!(output.matches("HTTP/1.1").count(), 1);
    }

    #[tokio::test]
    async fn head_suppresses_body() {
        let output = exchange(b"HEAD /abc HTTP/1.1\r\nHost: x\r\n\r\n").await;

        assert!(output.contains("Content-Length: 4\r\n"));
        assert!(output.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn handler_error_is_500() {
        let (client, server) = duplex(8 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let handler = make_handler(|_request: Request<Option<Bytes>>| async { Err::<Response<Option<Payload>>, _>("boom") });
        let task = tokio::spawn(HttpConnection::new(server_read, server_write).process(Arc::new(handler)));

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        task.await.unwrap().unwrap();

        assert!(output.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(output.contains("<h1>500 Internal Server Error</h1>"));
    }

    #[tokio::test]
    async fn idle_timeout_closes_quietly() {
        let (client, server) = duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let connection = HttpConnection::new(server_read, server_write).with_idle_timeout(Some(Duration::from_millis(20)));

        let result = connection.process(Arc::new(make_handler(echo))).await;
        assert!(result.is_ok());
        drop(client);
    }
}
