//! Serde helpers for record timestamps.
//!
//! Timestamps in the data files are naive UTC ISO-8601 strings with
//! microsecond precision (`2025-03-01T09:30:00.123456`). Reading also accepts
//! the same form without a fractional part and full RFC 3339 strings with an
//! offset, which are converted to UTC.
//!
//! Use with `#[serde(with = "school_reviews_core::timestamp")]` on a
//! `DateTime<Utc>` field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format used when writing timestamps.
pub const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format a timestamp the way it is stored on disk.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(WRITE_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// # Errors
///
/// Returns the naive-format parse error if the input matches neither
/// accepted form.
pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, READ_FORMAT).map(|naive| naive.and_utc())
}

/// Serialize a timestamp as a naive UTC ISO string.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

/// Deserialize a timestamp from either accepted string form.
///
/// # Errors
///
/// Fails if the value is not a string or cannot be parsed.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_writes_naive_microseconds() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let json = serde_json::to_string(&Stamped { at }).unwrap();
        assert_eq!(json, r#"{"at":"2025-03-01T09:30:00.000000"}"#);
    }

    #[test]
    fn test_reads_naive_with_fraction() {
        let parsed = parse("2024-11-05T22:14:03.512345").unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 512_345);
        assert_eq!(format(&parsed), "2024-11-05T22:14:03.512345");
    }

    #[test]
    fn test_reads_naive_without_fraction() {
        let parsed = parse("2024-11-05T22:14:03").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 11, 5, 22, 14, 3).unwrap());
    }

    #[test]
    fn test_reads_rfc3339_with_offset() {
        let parsed = parse("2024-11-06T09:14:03+11:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 11, 5, 22, 14, 3).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(serde_json::from_str::<Stamped>(r#"{"at":"soon"}"#).is_err());
    }
}
