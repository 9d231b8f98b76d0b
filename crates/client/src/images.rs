//! Finds the images embedded in an HTML page.

/// Returns the `src` and `lowsrc` values of every `<img>` tag in `html` that
/// point at the same server, as absolute paths in document order.
///
/// Values naming another server (anything with `://`) are skipped; relative
/// values get a leading `/`.
pub fn find_image_sources(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut sources = Vec::new();

    let mut pos = 0;
    while let Some(found) = lower[pos..].find("<img") {
        let tag_start = pos + found + "<img".len();
        let Some(tag_len) = lower[tag_start..].find('>') else {
            break;
        };
        let tag_end = tag_start + tag_len;

        collect_sources(&html[tag_start..tag_end], &lower[tag_start..tag_end], &mut sources);
        pos = tag_end;
    }

    sources
}

fn collect_sources(tag: &str, lower: &str, sources: &mut Vec<String>) {
    let mut pos = 0;
    while let Some(found) = lower[pos..].find("src") {
        let name_start = pos + found;
        let name_end = name_start + "src".len();
        pos = name_end;

        // whatever precedes `src` inside the same attribute name
        let prefix = lower[..name_start].rsplit(|c: char| c.is_ascii_whitespace()).next().unwrap_or_default();
        if !prefix.is_empty() && prefix != "low" {
            continue;
        }

        let Some(value) = attribute_value(&tag[name_end..]) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value.contains("://") {
            continue;
        }

        sources.push(if value.starts_with('/') { value.to_string() } else { format!("/{value}") });
    }
}

/// Reads the value of an attribute from the text following its name.
fn attribute_value(rest: &str) -> Option<&str> {
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let inner = &rest[1..];
            inner.find(quote).map(|end| &inner[..end])
        }
        _ => rest.split(|c: char| c.is_ascii_whitespace()).next().map(|value| value.trim_end_matches('/')),
    }
}
