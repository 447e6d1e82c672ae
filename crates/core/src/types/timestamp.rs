//! Normalization of remote timestamps.
//!
//! Shopify reports `created_at`/`updated_at` as ISO 8601 strings with a UTC
//! offset (`2024-01-15T10:30:00-05:00`). The local catalog stores the same
//! instants as integer epoch seconds, so every comparison and every write
//! goes through [`parse_remote_timestamp`].

use chrono::{DateTime, NaiveDateTime};

/// Naive layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Errors that can occur when parsing a remote timestamp.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The input string is empty.
    #[error("timestamp cannot be empty")]
    Empty,
    /// The input is not in a recognized datetime format.
    #[error("unrecognized timestamp: {0}")]
    Unrecognized(String),
}

/// Convert a remote textual datetime to epoch seconds.
///
/// Accepts RFC 3339 (the Shopify format), offset-less `T`- or
/// space-separated datetimes (treated as UTC), and plain epoch seconds.
///
/// # Errors
///
/// Returns [`TimestampError`] if the input is empty or not a recognized format.
///
/// # Examples
///
/// ```
/// use camerazon_core::parse_remote_timestamp;
///
/// assert_eq!(parse_remote_timestamp("1970-01-01T00:00:00Z"), Ok(0));
/// assert_eq!(parse_remote_timestamp("1970-01-01T01:00:00+01:00"), Ok(0));
/// assert!(parse_remote_timestamp("yesterday").is_err());
/// ```
pub fn parse_remote_timestamp(value: &str) -> Result<i64, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.timestamp());
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc().timestamp());
        }
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<i64>()
            .map_err(|_| TimestampError::Unrecognized(value.to_string()));
    }

    Err(TimestampError::Unrecognized(value.to_string()))
}
