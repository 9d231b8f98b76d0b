use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderValue, Method, Request, Response, StatusCode, Uri, Version};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::protocol::{
    HttpError, Message, ParseError, Payload, PayloadCollector, PayloadItem, PayloadSize, RequestHeader, ResponseHead,
    SendError, escape_path, wants_close,
};

/// The client side of one HTTP/1.1 connection.
///
/// Requests are sent strictly one at a time: [`ClientConnection::send_request`]
/// writes a request and reads its complete response before returning. The
/// connection stays usable while it is persistent; it stops being persistent
/// once the server answers `Connection: close`, answers with a version other
/// than HTTP/1.1 or with `501`, or once an exchange fails.
#[derive(Debug)]
pub struct ClientConnection<R, W> {
    framed_read: FramedRead<R, ResponseDecoder>,
    framed_write: FramedWrite<W, RequestEncoder>,
    authority: String,
    persistent: bool,
    read_timeout: Option<Duration>,
}

pub type TcpClientConnection = ClientConnection<OwnedReadHalf, OwnedWriteHalf>;

impl ClientConnection<OwnedReadHalf, OwnedWriteHalf> {
    /// Opens a TCP connection to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, HttpError> {
        let authority = if port == 80 { host.to_string() } else { format!("{host}:{port}") };
        let stream = TcpStream::connect((host, port)).await.map_err(|e| HttpError::connect(&authority, e))?;
        info!(authority = %authority, "connected");

        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer, authority))
    }
}

impl<R, W> ClientConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps an established connection; `authority` is sent as the `Host` header.
    pub fn new<S: Into<String>>(reader: R, writer: W, authority: S) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, ResponseDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, RequestEncoder::new()),
            authority: authority.into(),
            persistent: true,
            read_timeout: None,
        }
    }

    /// Fails an exchange whose response does not make progress within `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Sends one request and reads its response.
    ///
    /// Spaces in `path` are escaped before the request is written. The response
    /// body is `None` when the response carries no body (HEAD, 1xx, 204, 304, 501).
    pub async fn send_request(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
    ) -> Result<Response<Option<Bytes>>, HttpError> {
        if !self.persistent {
            return Err(HttpError::ConnectionClosed);
        }

        let result = self.do_send_request(method, path, payload).await;
        match &result {
            Ok(response) => {
                if wants_close(response.headers())
                    || response.version() != Version::HTTP_11
                    || response.status() == StatusCode::NOT_IMPLEMENTED
                {
                    debug!(authority = %self.authority, "connection is no longer persistent");
                    self.persistent = false;
                }
            }
            Err(_) => self.persistent = false,
        }
        result
    }

    async fn do_send_request(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
    ) -> Result<Response<Option<Bytes>>, HttpError> {
        let mut request = Request::new(());
        *request.method_mut() = method.clone();
        *request.uri_mut() = Uri::try_from(escape_path(path)).map_err(|_| ParseError::InvalidUri)?;
        let host = HeaderValue::from_str(&self.authority).map_err(|_| ParseError::invalid_header("invalid host"))?;
        request.headers_mut().insert(HOST, host);

        let (payload_size, body) = match payload {
            Some(payload) => {
                let content_type = HeaderValue::from_str(payload.content_type().as_ref())
                    .map_err(|_| SendError::invalid_body("invalid content type"))?;
                request.headers_mut().insert(CONTENT_TYPE, content_type);
                (PayloadSize::new_length(payload.len() as u64), Some(payload.into_bytes()))
            }
            None => (PayloadSize::new_empty(), None),
        };

        info!(method = %method, path = %path, authority = %self.authority, "sending request");
        self.framed_read.decoder_mut().expect_response_to(method);

        let header = Message::<_, Bytes>::Header((RequestHeader::from(request), payload_size));
        self.framed_write.feed(header).await?;
        if let Some(body) = body {
            self.framed_write.feed(Message::Payload(PayloadItem::Chunk(body))).await?;
        }
        self.framed_write.send(Message::Payload(PayloadItem::<Bytes>::Eof)).await?;

        self.read_response().await
    }

    async fn read_response(&mut self) -> Result<Response<Option<Bytes>>, HttpError> {
        let (head, payload_size) = match self.next_message().await? {
            Some(Message::Header(head)) => head,
            Some(Message::Payload(_)) | None => return Err(HttpError::ConnectionClosed),
        };
        info!(status = %head.status(), "received response");

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

        let (parts, ()) = ResponseHead::into_parts(head);
        Ok(Response::from_parts(parts, body))
    }

    async fn next_message(&mut self) -> Result<Option<Message<(ResponseHead, PayloadSize)>>, HttpError> {
        let next = match self.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.framed_read.next()).await.map_err(|_| HttpError::Timeout)?,
            None => self.framed_read.next().await,
        };

        Ok(next.transpose()?)
    }
}
