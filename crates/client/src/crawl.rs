//! Saving a fetched page and the images embedded in it.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use ferry_http::client::HttpClient;
use ferry_http::protocol::header_str;
use http::Response;
use http::header::CONTENT_TYPE;
use mime::Mime;
use tracing::{info, warn};

use crate::images::find_image_sources;
use crate::save::{SavedAs, output_path, save_body};

/// Saves the body of `response` and fetches embedded images breadth first.
///
/// Images are fetched with `client`, so they reuse its connection. Every path
/// is fetched at most once, and pages more than `max_depth` links away from
/// the first one are not scanned. A failed fetch or save is reported and the
/// remaining images are still processed. Returns the files written.
pub async fn save_and_crawl(
    client: &mut HttpClient,
    output_dir: &Path,
    path: &str,
    response: Response<Option<Bytes>>,
    max_depth: usize,
) -> Vec<PathBuf> {
    let host = client.host().to_string();
    let mut saved = Vec::new();
    let mut visited = HashSet::from([path.to_string()]);
    let mut queue = VecDeque::new();

    let mut next = Some((path.to_string(), response, 0));
    while let Some((path, response, depth)) = next.take() {
        if let Some(body) = response.body() {
            let content_type = content_type(&response);
            let file = output_path(output_dir, &host, &path, &content_type);

            match save_body(&file, body, &content_type).await {
                Ok(saved_as) => {
                    let kind = if saved_as == SavedAs::Text { "TEXT" } else { "BINARY" };
                    println!("{kind} FILE CREATED: {}", file.display());
                    saved.push(file);
                }
                Err(e) => eprintln!("Error: {e}"),
            }

            if content_type.essence_str() == mime::TEXT_HTML.essence_str() {
                if depth < max_depth {
                    let html = String::from_utf8_lossy(body);
                    for image in find_image_sources(&html) {
                        if visited.insert(image.clone()) {
                            queue.push_back((image, depth + 1));
                        }
                    }
                } else {
                    info!(path = %path, depth, "depth budget reached, not scanning for images");
                }
            }
        }

        while let Some((image, depth)) = queue.pop_front() {
            match client.get(&image).await {
                Ok(response) => {
                    next = Some((image, response, depth));
                    break;
                }
                Err(e) => {
                    warn!(cause = %e, path = %image, "can't fetch embedded image");
                    eprintln!("Error: can't fetch {image}: {e}");
                }
            }
        }
    }

    saved
}

/// The media type of a response, `application/octet-stream` when it has none.
fn content_type<T>(response: &Response<T>) -> Mime {
    header_str(response.headers(), CONTENT_TYPE.as_str())
        .and_then(|value| value.parse().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
