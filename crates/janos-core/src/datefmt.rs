//! Date-scalar detection and formatting helpers shared by the frontmatter
//! decoder, the `date` template filter, and the feeds stage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Recognize a string as a date or datetime scalar per §4.2: a bare
/// `YYYY-MM-DD` date (treated as UTC midnight) or a full RFC 3339 /
/// ISO 8601 datetime. Returns `None` for anything else, so callers can fall
/// back to treating the value as a plain string.
pub fn parse_date_scalar(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    }
    None
}

/// RFC 822 formatting for RSS `pubDate` elements.
pub fn to_rfc822(dt: DateTime<Utc>) -> String {
    dt.to_rfc2822()
}

/// RFC 3339 formatting for Atom/sitemap timestamps.
pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_bare_date() {
        let dt = parse_date_scalar("2023-05-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-05-01T00:00:00+00:00");
    }

    #[test]
    fn recognizes_rfc3339() {
        let dt = parse_date_scalar("2023-05-01T12:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-05-01T12:30:00+00:00");
    }

    #[test]
    fn rejects_non_date_strings() {
        assert!(parse_date_scalar("hello world").is_none());
        assert!(parse_date_scalar("draft").is_none());
    }
}
