//! Raw level events and daily aggregates as returned by the API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Device state reported by a level.
///
/// Only `asleep` and `soothing` feed session duration totals. Every other
/// state the device reports is folded into [`LevelType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelType {
    Asleep,
    Soothing,
    Other,
}

impl LevelType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asleep => "asleep",
            Self::Soothing => "soothing",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "asleep" => Self::Asleep,
            "soothing" => Self::Soothing,
            _ => Self::Other,
        })
    }
}

impl Serialize for LevelType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LevelType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        // Infallible: unknown states map to Other.
        Ok(s.parse().unwrap_or(Self::Other))
    }
}

/// A single state transition reported by the bassinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub session_id: String,
    #[serde(rename = "type", default = "default_level_type")]
    pub kind: LevelType,
    #[serde(
        default = "timestamp::unset",
        deserialize_with = "timestamp::deserialize"
    )]
    pub start_time: DateTime<Utc>,
    /// Seconds spent in this state.
    #[serde(default)]
    pub state_duration: u32,
    #[serde(default)]
    pub is_active: bool,
}

const fn default_level_type() -> LevelType {
    LevelType::Other
}

impl Level {
    /// When the device left this state.
    ///
    /// Saturates at the latest representable instant.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time
            .checked_add_signed(TimeDelta::seconds(i64::from(self.state_duration)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Server-computed summary for one calendar day.
///
/// Durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayAggregate {
    pub naps: u32,
    pub longest_sleep: u32,
    pub total_sleep: u32,
    pub day_sleep: u32,
    pub night_sleep: u32,
    pub night_wakings: u32,
    pub timezone: String,
    pub levels: Vec<Level>,
}

/// A fetched aggregate together with the day it was requested for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub aggregate: DayAggregate,
}
