//! Core domain logic for SNOO sleep telemetry.
//!
//! This crate contains the fundamental types and logic for:
//! - Levels and daily aggregates as reported by the API
//! - Timestamp parsing for the API's mixed date layouts
//! - Day ranges: walking an inclusive span of calendar days
//! - Session reconstruction: folding levels into sleep sessions

pub mod level;
pub mod range;
pub mod session;
pub mod timestamp;

pub use level::{DayAggregate, DayRecord, Level, LevelType};
pub use range::{DayRange, Days};
pub use session::{Session, SessionBuilder, reconstruct_sessions};
pub use timestamp::{TimestampParseError, parse_timestamp};
