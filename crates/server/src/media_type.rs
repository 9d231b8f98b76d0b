//! Content type detection by file extension.

use mime::Mime;
use std::path::Path;

/// Returns the media type served for `path`.
///
/// # Examples
/// ```
/// use ferry_server::media_type::content_type;
/// use std::path::Path;
/// assert_eq!(content_type(Path::new("index.html")), mime::TEXT_HTML);
/// assert_eq!(content_type(Path::new("song.mp3")).essence_str(), "audio/mpeg");
/// assert_eq!(content_type(Path::new("archive")), mime::APPLICATION_OCTET_STREAM);
/// ```
pub fn content_type(path: &Path) -> Mime {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML,
        Some("txt") => mime::TEXT_PLAIN,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("mp3") => parse_static("audio/mpeg"),
        Some("mp4") => parse_static("video/mp4"),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_static(media_type: &'static str) -> Mime {
    media_type.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
