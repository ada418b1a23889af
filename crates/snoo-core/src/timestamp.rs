//! Timestamp parsing for level start times.
//!
//! The aggregation endpoint usually reports RFC 3339 timestamps, but some
//! levels come back as `2020-08-08 00:00:00.000` (no offset, UTC). Both are
//! accepted. A missing or `null` value is not an error: it decodes to
//! [`UNSET`].

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// The zero timestamp used when the API omits a start time.
pub const UNSET: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Neither accepted timestamp format matched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid timestamp: {value:?}")]
pub struct TimestampParseError {
    pub value: String,
}

/// A timestamp layout the API is known to emit.
#[derive(Debug, Clone, Copy)]
enum Layout {
    Rfc3339,
    /// Naive layout, interpreted as UTC.
    Naive(&'static str),
}

/// Layouts tried in order; the first that parses wins.
const LAYOUTS: &[Layout] = &[Layout::Rfc3339, Layout::Naive("%Y-%m-%d %H:%M:%S%.3f")];

/// Years a layout may produce. chrono's `%Y` also takes signed years of
/// more than four digits, which the API never sends.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

impl Layout {
    fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        let parsed = match self {
            Self::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Naive(fmt) => NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.and_utc()),
        };
        parsed.filter(|dt| YEARS.contains(&dt.year()))
    }
}

/// Parses a level timestamp.
///
/// The literal string `null` yields [`UNSET`].
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let s = s.trim();
    if s == "null" {
        return Ok(UNSET);
    }

    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(s))
        .ok_or_else(|| TimestampParseError {
            value: s.to_string(),
        })
}

/// Serde adapter for `#[serde(deserialize_with = ...)]` on start times.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw).map_err(serde::de::Error::custom),
        None => Ok(UNSET),
    }
}

pub(crate) const fn unset() -> DateTime<Utc> {
    UNSET
}
