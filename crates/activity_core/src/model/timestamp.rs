//! Activity timestamp parsing and wire formatting.
//!
//! # Responsibility
//! - Accept the date shapes found in seed snapshots and caller payloads.
//! - Emit one canonical RFC 3339 shape (`YYYY-MM-DDTHH:MM:SS.mmmZ`).
//!
//! # Invariants
//! - Every accepted input resolves to a UTC instant.
//! - Date-only inputs resolve to midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Parses one activity timestamp.
///
/// Accepted shapes, tried in order:
/// - RFC 3339 with offset (`2024-01-01T10:00:00Z`, `2024-01-01T10:00:00+02:00`)
/// - naive date-time, read as UTC (`2024-01-01T10:00:00`, `2024-01-01 10:00:00.5`)
/// - date only, read as midnight UTC (`2024-01-01`)
///
/// # Errors
/// - Returns a human-readable message when no shape matches.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("timestamp cannot be empty".to_string());
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_ONLY_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(format!(
        "invalid timestamp `{trimmed}`; expected RFC 3339 or YYYY-MM-DD"
    ))
}

/// Formats one timestamp in canonical wire shape.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for required timestamp fields.
pub mod serde_utc {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamp fields (`null` and absent map to `None`).
pub mod serde_utc_option {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format_timestamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
