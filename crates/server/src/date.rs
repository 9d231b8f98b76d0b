//! `Last-Modified` and `If-Modified-Since` dates.
//!
//! Dates travel in the RFC 1123 form `Sun, 06 Nov 1994 08:49:37 GMT` and carry
//! whole seconds only, so modification times are truncated before they are
//! compared or sent.

use chrono::{DateTime, SubsecRound, Utc};
use std::time::SystemTime;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}

/// Parses an RFC 1123 date. Returns `None` for anything else.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim()).ok().map(|date| date.with_timezone(&Utc))
}

/// The modification time of a resource as it is compared and reported.
pub fn last_modified(modified: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(modified).trunc_subsecs(0)
}
