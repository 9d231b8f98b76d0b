//! Serving requests from a [`ResourceStore`].

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use tracing::{info, warn};

use chrono::{DateTime, Utc};
use ferry_http::handler::Handler;
use ferry_http::protocol::{Payload, header_str, status_response, unescape_path};

use crate::conditional::is_modified_since;
use crate::date::format_http_date;
use crate::media_type::content_type;
use crate::store::{ResourceStore, StoreError};

/// Answers requests with the files of one resource tree.
///
/// - GET and HEAD send the file, or `304 Not Modified` when the request's
///   `If-Modified-Since` is not older than the file
/// - PUT replaces the file and echoes the stored content
/// - any other method appends its body to an existing file and returns the result
///
/// A path ending in `/` names the `index.html` of that directory. Missing files
/// are answered with `404 Not Found`.
#[derive(Debug, Clone)]
pub struct FileHandler {
    store: ResourceStore,
}

impl FileHandler {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    async fn get(&self, path: &str, if_modified_since: Option<&str>) -> Result<Response<Option<Payload>>, StoreError> {
        let Some(file) = self.store.resolve(path) else {
            return Ok(status_response(StatusCode::NOT_FOUND));
        };
        let Some(resource) = self.store.read(&file).await? else {
            info!(path = %path, "resource not found");
            return Ok(status_response(StatusCode::NOT_FOUND));
        };

        let mut response = if is_modified_since(if_modified_since, resource.last_modified) {
            Response::new(Some(Payload::new(content_type(&file), resource.content)))
        } else {
            let mut response = Response::new(None);
            *response.status_mut() = StatusCode::NOT_MODIFIED;
            response
        };

        insert_last_modified(&mut response, resource.last_modified);
        Ok(response)
    }

    async fn put(&self, path: &str, body: Bytes) -> Result<Response<Option<Payload>>, StoreError> {
        let Some(file) = self.store.resolve(path) else {
            return Ok(status_response(StatusCode::NOT_FOUND));
        };

        self.store.write(&file, &body).await?;
        info!(path = %path, size = body.len(), "resource replaced");
        Ok(Response::new(Some(text_payload(body))))
    }

    async fn append(&self, path: &str, body: Bytes) -> Result<Response<Option<Payload>>, StoreError> {
        let Some(file) = self.store.resolve(path) else {
            return Ok(status_response(StatusCode::NOT_FOUND));
        };

        match self.store.append(&file, &body).await? {
            Some(content) => {
                info!(path = %path, size = content.len(), "resource appended");
                Ok(Response::new(Some(text_payload(content))))
            }
            None => Ok(status_response(StatusCode::NOT_FOUND)),
        }
    }
}

#[async_trait]
impl Handler for FileHandler {
    type Error = StoreError;

    async fn call(&self, req: Request<Option<Bytes>>) -> Result<Response<Option<Payload>>, Self::Error> {
        let (parts, body) = req.into_parts();

        let mut path = unescape_path(parts.uri.path());
        if path.ends_with('/') {
            path.push_str("index.html");
        }

        if parts.method == Method::GET || parts.method == Method::HEAD {
            let if_modified_since = header_str(&parts.headers, IF_MODIFIED_SINCE.as_str());
            self.get(&path, if_modified_since).await
        } else if parts.method == Method::PUT {
            self.put(&path, body.unwrap_or_default()).await
        } else {
            self.append(&path, body.unwrap_or_default()).await
        }
    }
}

fn text_payload(content: Bytes) -> Payload {
    Payload::new(mime::TEXT_PLAIN, content)
}

fn insert_last_modified<T>(response: &mut Response<T>, last_modified: DateTime<Utc>) {
    match HeaderValue::from_str(&format_http_date(last_modified)) {
        Ok(value) => {
            response.headers_mut().insert(LAST_MODIFIED, value);
        }
        Err(e) => warn!(cause = %e, "can't build last-modified header"),
    }
}
