//! Redirect following for the client.
//!
//! A `301` or `302` response to a GET or HEAD request that carries a `Location`
//! header is followed by replaying the same method on a new connection to the
//! location's authority. POST and PUT are never replayed. Following is best
//! effort: a location that cannot be used, or a hop that fails, leaves the last
//! response in place. Hops are counted and stop at the configured budget.

use bytes::Bytes;
use http::header::LOCATION;
use http::{Method, Response, StatusCode, Uri};
use tracing::{info, warn};

use crate::connection::TcpClientConnection;
use crate::protocol::header_str;

/// Port used when a location names none.
const DEFAULT_PORT: u16 = 80;

/// Where a redirect points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Works out the target of a redirect response.
///
/// `origin` is the host and port the response came from; it is used for
/// locations that are absolute paths such as `/new`. Returns `None` when the
/// response must not be followed.
pub fn redirect_target<T>(response: &Response<T>, method: &Method, origin: (&str, u16)) -> Option<RedirectTarget> {
    if !matches!(response.status(), StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND) {
        return None;
    }

    if *method != Method::GET && *method != Method::HEAD {
        return None;
    }

    let location = header_str(response.headers(), LOCATION.as_str())?.trim();
    if location.starts_with('/') {
        let (host, port) = origin;
        return Some(RedirectTarget { host: host.to_string(), port, path: location.to_string() });
    }

    let uri = match Uri::try_from(location) {
        Ok(uri) => uri,
        Err(e) => {
            warn!(location = %location, cause = %e, "invalid redirect location");
            return None;
        }
    };

    if uri.scheme_str() != Some("http") {
        warn!(location = %location, "redirect location is not an http url");
        return None;
    }

    let host = uri.host()?.to_string();
    let port = uri.port_u16().unwrap_or(DEFAULT_PORT);
    let path = uri.path_and_query().map(|path| path.as_str()).filter(|path| !path.is_empty()).unwrap_or("/").to_string();

    Some(RedirectTarget { host, port, path })
}

/// Follows redirects with a bounded number of hops.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    max_redirects: usize,
    read_timeout: Option<std::time::Duration>,
}

impl RedirectResolver {
    pub fn new(max_redirects: usize, read_timeout: Option<std::time::Duration>) -> Self {
        Self { max_redirects, read_timeout }
    }

    /// Returns the response at the end of the redirect chain that starts with
    /// `response`, or `response` itself when it is not a redirect to follow.
    ///
    /// Every hop opens a fresh connection; the connection the original response
    /// came from is not used for the redirected call.
    pub async fn resolve(
        &self,
        response: Response<Option<Bytes>>,
        method: &Method,
        origin: (&str, u16),
    ) -> Response<Option<Bytes>> {
        let mut response = response;
        let mut origin = (origin.0.to_string(), origin.1);

        for hop in 0..=self.max_redirects {
            let Some(target) = redirect_target(&response, method, (origin.0.as_str(), origin.1)) else {
                return response;
            };

            if hop == self.max_redirects {
                warn!(max_redirects = self.max_redirects, host = %target.host, path = %target.path, "too many redirects, stop following");
                return response;
            }

            info!(status = %response.status(), host = %target.host, port = target.port, path = %target.path, "following redirect");
            match self.follow(&target, method).await {
                Some(redirected) => {
                    response = redirected;
                    origin = (target.host, target.port);
                }
                None => return response,
            }
        }

        response
    }

    async fn follow(&self, target: &RedirectTarget, method: &Method) -> Option<Response<Option<Bytes>>> {
        let connection = TcpClientConnection::connect(&target.host, target.port).await;
        let mut connection = match connection {
            Ok(connection) => connection.with_read_timeout(self.read_timeout),
            Err(e) => {
                warn!(cause = %e, "can't follow redirect");
                return None;
            }
        };

        match connection.send_request(method.clone(), &target.path, None).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(cause = %e, host = %target.host, path = %target.path, "redirected request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn redirect(status: StatusCode, location: Option<&str>) -> Response<Option<Bytes>> {
        let mut builder = Response::builder().status(status);
        if let Some(location) = location {
            builder = builder.header(LOCATION, location);
        }
        builder.body(None).unwrap()
    }

    /// Serves `reply` to every connection and reports each received request line.
    async fn canned_server(reply: String) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                while !received.ends_with(b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => received.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&received);
                let _ = tx.send(request.lines().next().unwrap_or_default().to_string());
                let _ = stream.write_all(reply.as_bytes()).await;
            }
        });

        (addr, rx)
    }

    #[test]
    fn absolute_location() {
        let response = redirect(StatusCode::FOUND, Some("http://example.com/new"));
        let target = redirect_target(&response, &Method::GET, ("localhost", 8000)).unwrap();

        assert_eq!(target, RedirectTarget { host: "example.com".into(), port: 80, path: "/new".into() });
    }

    #[test]
    fn location_with_port_and_query() {
        let response = redirect(StatusCode::MOVED_PERMANENTLY, Some("http://example.com:8080/a?b=c"));
        let target = redirect_target(&response, &Method::HEAD, ("localhost", 8000)).unwrap();

        assert_eq!(target, RedirectTarget { host: "example.com".into(), port: 8080, path: "/a?b=c".into() });
    }

    #[test]
    fn relative_location_uses_origin() {
        let response = redirect(StatusCode::FOUND, Some("/moved/here.html"));
        let target = redirect_target(&response, &Method::GET, ("localhost", 8000)).unwrap();

        assert_eq!(target, RedirectTarget { host: "localhost".into(), port: 8000, path: "/moved/here.html".into() });
    }

    #[test]
    fn not_followed() {
        // 301 without location
        assert!(redirect_target(&redirect(StatusCode::MOVED_PERMANENTLY, None), &Method::GET, ("h", 80)).is_none());
        // other statuses
        assert!(redirect_target(&redirect(StatusCode::SEE_OTHER, Some("http://a/")), &Method::GET, ("h", 80)).is_none());
        // POST and PUT are not replayed
        assert!(redirect_target(&redirect(StatusCode::FOUND, Some("http://a/")), &Method::POST, ("h", 80)).is_none());
        assert!(redirect_target(&redirect(StatusCode::FOUND, Some("http://a/")), &Method::PUT, ("h", 80)).is_none());
        // unusable locations
        assert!(redirect_target(&redirect(StatusCode::FOUND, Some("https://a/")), &Method::GET, ("h", 80)).is_none());
        assert!(redirect_target(&redirect(StatusCode::FOUND, Some("http://a b/")), &Method::GET, ("h", 80)).is_none());
    }

    #[tokio::test]
    async fn replays_get_on_location_authority() {
        let (addr, mut requests) =
            canned_server("HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nnew".to_string()).await;
        let location = format!("http://127.0.0.1:{}/new", addr.port());

        let resolver = RedirectResolver::new(5, None);
        let response = resolver.resolve(redirect(StatusCode::FOUND, Some(&location)), &Method::GET, ("localhost", 1)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_deref(), Some(&b"new"[..]));
        assert_eq!(requests.recv().await.unwrap(), "GET /new HTTP/1.1");
    }

    #[tokio::test]
    async fn hop_budget_stops_loops() {
        // the server redirects every request to itself
        let (addr, mut requests) = canned_server(
            "HTTP/1.1 302 Found\r\nLocation: /loop\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;

        let resolver = RedirectResolver::new(2, None);
        let start = redirect(StatusCode::FOUND, Some(&format!("http://127.0.0.1:{}/start", addr.port())));
        let response = resolver.resolve(start, &Method::GET, ("localhost", 1)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(requests.recv().await.unwrap(), "GET /start HTTP/1.1");
        assert_eq!(requests.recv().await.unwrap(), "GET /loop HTTP/1.1");
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn unreachable_target_keeps_original() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let resolver = RedirectResolver::new(5, None);
        let original = redirect(StatusCode::FOUND, Some(&format!("http://127.0.0.1:{port}/gone")));
        let response = resolver.resolve(original, &Method::GET, ("localhost", 1)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
