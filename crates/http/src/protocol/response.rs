//! HTTP response head handling.
//!
//! [`ResponseHead`] is an `http::Response<()>` whose body is attached later. The
//! reason phrase received from a peer is kept in the response extensions as a
//! [`ReasonPhrase`], since `http::Response` has no field for it.

use http::{Response, StatusCode};

use crate::protocol::Payload;

/// Type alias for HTTP response headers.
pub type ResponseHead = Response<()>;

/// The reason phrase of a received status line, e.g. `Not Found`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(String);

impl ReasonPhrase {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns true for statuses whose responses never carry body bytes, whatever
/// their framing headers say.
pub fn is_bodiless_status(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

/// Minimal HTML document describing `status`, used as the default body of every
/// non-200 response.
pub fn status_page(status: StatusCode) -> Payload {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let code = status.as_str();
    let document = [
        "<!DOCTYPE html>",
        "<head>",
        "  <meta charset='utf-8'>",
        &format!("  <title>{code}</title>"),
        "</head>",
        "<body>",
        "",
        &format!("<h1>{code} {reason}</h1>"),
        "",
        "</body>",
        "</html>",
    ]
    .join("\n");

    Payload::new(mime::TEXT_HTML, document)
}

/// Builds a response carrying the default status page for `status`.
pub fn status_response(status: StatusCode) -> Response<Option<Payload>> {
    let mut response = Response::new(Some(status_page(status)));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_page_mentions_code_and_reason() {
        let page = status_page(StatusCode::NOT_FOUND);
        let text = std::str::from_utf8(page.bytes()).unwrap();

        assert!(text.starts_with("<!DOCTYPE html>"));
        assert!(text.contains("<title>404</title>"));
        assert!(text.contains("<h1>404 Not Found</h1>"));
        assert_eq!(page.content_type(), &mime::TEXT_HTML);
    }

    #[test]
    fn bodiless_statuses() {
        assert!(is_bodiless_status(StatusCode::CONTINUE));
        assert!(is_bodiless_status(StatusCode::NO_CONTENT));
        assert!(is_bodiless_status(StatusCode::NOT_MODIFIED));
        assert!(!is_bodiless_status(StatusCode::OK));
        assert!(!is_bodiless_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn status_response_has_page_body() {
        let response = status_response(StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.body().is_some());
    }
}
