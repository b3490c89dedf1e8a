//! DateTime utilities.
//!
//! Helpers for converting between `chrono` timestamps and the whole-second
//! Unix times embedded in tie-break scores.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Get the current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a datetime string into a UTC DateTime.
///
/// Supports multiple common formats:
/// - ISO 8601 (RFC 3339): "2023-12-01T12:30:45Z"
/// - ISO 8601 with offset: "2023-12-01T12:30:45-05:00"
/// - Naive "2023-12-01 12:30:45", assumed UTC
/// - Unix seconds: "1400000001"
///
/// # Examples
///
/// ```
/// use leaders_common::datetime::parse_datetime;
///
/// let dt = parse_datetime("2023-12-01T12:30:45Z").expect("Failed to parse");
/// assert_eq!(dt.timestamp(), 1701433845);
/// ```
pub fn parse_datetime(datetime_str: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(secs) = datetime_str.parse::<i64>() {
        return from_unix_seconds(secs)
            .ok_or_else(|| format!("Unix timestamp out of range: {}", secs));
    }

    DateTime::parse_from_rfc3339(datetime_str)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| Utc.from_utc_datetime(&ndt))
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M:%S")
                .map(|ndt| Utc.from_utc_datetime(&ndt))
        })
        .map_err(|e| format!("Failed to parse datetime '{}': {}", datetime_str, e))
}

/// Format a DateTime as an ISO 8601 / RFC 3339 string.
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339()
}

/// Convert whole Unix seconds into a UTC DateTime.
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
