use chrono::{DateTime, Utc};
use tracing::warn;

use crate::date::parse_http_date;

/// Decides whether a resource has to be sent in full for a conditional GET.
///
/// The resource counts as modified when no `If-Modified-Since` value was sent,
/// when the value does not parse, or when it lies before `last_modified`.
pub fn is_modified_since(if_modified_since: Option<&str>, last_modified: DateTime<Utc>) -> bool {
    let Some(value) = if_modified_since else {
        return true;
    };

    match parse_http_date(value) {
        Some(since) => since < last_modified,
        None => {
            warn!(value = %value, "malformed if-modified-since, sending the full resource");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::format_http_date;
    use chrono::{TimeDelta, TimeZone};

    fn modified_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn absent_header() {
        assert!(is_modified_since(None, modified_at()));
    }

    #[test]
    fn earlier_date_means_modified() {
        let since = format_http_date(modified_at() - TimeDelta::seconds(1));
        assert!(is_modified_since(Some(&since), modified_at()));
    }

    #[test]
    fn same_or_later_date_means_not_modified() {
        let same = format_http_date(modified_at());
        assert!(!is_modified_since(Some(&same), modified_at()));

        let later = format_http_date(modified_at() + TimeDelta::seconds(1));
        assert!(!is_modified_since(Some(&later), modified_at()));
    }

    #[test]
    fn malformed_fails_open() {
        assert!(is_modified_since(Some("not a date"), modified_at()));
    }
}
