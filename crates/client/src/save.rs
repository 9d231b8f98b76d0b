//! Storing response bodies on disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use ferry_http::protocol::unescape_path;
use mime::Mime;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("can't save {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// How a body was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedAs {
    Text,
    Binary,
}

/// Where the body fetched from `request_path` on `host` is stored:
/// `<output_dir>/<host><path>`.
///
/// A path ending in `/` is stored as its `index.html`, and an HTML body always
/// gets the `.html` extension. The query and any `..` components are dropped.
pub fn output_path(output_dir: &Path, host: &str, request_path: &str, content_type: &Mime) -> PathBuf {
    let mut relative = unescape_path(request_path.split('?').next().unwrap_or_default());
    if relative.ends_with('/') {
        relative.push_str("index.html");
    }

    let mut path = output_dir.join(host);
    for component in Path::new(relative.trim_start_matches('/')).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }

    if content_type.essence_str() == mime::TEXT_HTML.essence_str() {
        path.set_extension("html");
    }
    path
}

/// Writes `body` to `path`, creating parent directories. Text bodies are
/// stored as UTF-8, anything else byte for byte.
pub async fn save_body(path: &Path, body: &[u8], content_type: &Mime) -> Result<SavedAs, SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|source| SaveError::Io { path: parent.to_path_buf(), source })?;
    }

    let saved_as = if content_type.type_() == mime::TEXT { SavedAs::Text } else { SavedAs::Binary };
    let result = match saved_as {
        SavedAs::Text => fs::write(path, String::from_utf8_lossy(body).as_bytes()).await,
        SavedAs::Binary => fs::write(path, body).await,
    };

    result.map_err(|source| SaveError::Io { path: path.to_path_buf(), source })?;
    Ok(saved_as)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_below_host_directory() {
        let out = Path::new("files");

        assert_eq!(output_path(out, "example.com", "/", &mime::TEXT_HTML), PathBuf::from("files/example.com/index.html"));
        assert_eq!(
            output_path(out, "example.com", "/img/logo.png", &mime::IMAGE_PNG),
            PathBuf::from("files/example.com/img/logo.png")
        );
        assert_eq!(
            output_path(out, "example.com", "/my%20photo.jpg", &mime::IMAGE_JPEG),
            PathBuf::from("files/example.com/my photo.jpg")
        );
    }

    #[test]
    fn html_gets_html_extension() {
        let out = Path::new("files");

        assert_eq!(output_path(out, "example.com", "/page.php?id=3", &mime::TEXT_HTML), PathBuf::from("files/example.com/page.html"));
        assert_eq!(output_path(out, "example.com", "/about", &mime::TEXT_HTML_UTF_8), PathBuf::from("files/example.com/about.html"));
        assert_eq!(output_path(out, "example.com", "/notes.txt", &mime::TEXT_PLAIN), PathBuf::from("files/example.com/notes.txt"));
    }

    #[test]
    fn traversal_is_dropped() {
        let out = Path::new("files");
        assert_eq!(output_path(out, "h", "/../../etc/passwd", &mime::TEXT_PLAIN), PathBuf::from("files/h/etc/passwd"));
    }

    #[tokio::test]
    async fn text_and_binary_bodies() {
        let dir = tempfile::tempdir().unwrap();

        let text = dir.path().join("h/index.html");
        assert_eq!(save_body(&text, b"<h1>Hi</h1>", &mime::TEXT_HTML).await.unwrap(), SavedAs::Text);
        assert_eq!(std::fs::read_to_string(&text).unwrap(), "<h1>Hi</h1>");

        let binary = dir.path().join("h/img/a.png");
        let bytes = [0x89, b'P', b'N', b'G', 0xff, 0x00];
        assert_eq!(save_body(&binary, &bytes, &mime::IMAGE_PNG).await.unwrap(), SavedAs::Binary);
        assert_eq!(std::fs::read(&binary).unwrap(), bytes);
    }
}
