//! Parses the loosely formatted dates found in front-matter into timestamps
//! so articles can be ordered chronologically.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

const DATE_TIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses `date` into a Unix timestamp in seconds. Accepts RFC 3339
/// (`2024-01-05T10:00:00+08:00`), naive date-times, and plain dates
/// (`2024-01-05`, read as midnight UTC). Returns [`None`] for anything else.
pub fn timestamp(date: &str) -> Option<i64> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.timestamp());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Orders two dates newest first. Unparsable dates come after every valid
/// one and compare equal among themselves.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (timestamp(a), timestamp(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
