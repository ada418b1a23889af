//! Fetching daily aggregates over a range of days.
//!
//! Days are requested one after another, in order. Under the default
//! [`FetchPolicy::Strict`] the first failing day aborts the whole range.

use chrono::NaiveDate;
use snoo_core::{DayRange, DayRecord, Level};
use thiserror::Error;

use crate::client::Client;
use crate::error::ApiError;

/// What to do when one day of a range fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Abort on the first failing day.
    #[default]
    Strict,
    /// Record the failure and move on to the next day.
    BestEffort,
}

/// A single day's request failed.
#[derive(Debug, Error)]
#[error("failed to fetch {date}: {source}")]
pub struct DayFetchError {
    pub date: NaiveDate,
    #[source]
    pub source: ApiError,
}

/// Days fetched from a range, plus any days that failed under
/// [`FetchPolicy::BestEffort`].
#[derive(Debug, Default)]
pub struct FetchReport {
    pub days: Vec<DayRecord>,
    pub failures: Vec<DayFetchError>,
}

impl FetchReport {
    /// All levels, in day order then response order.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.days.iter().flat_map(|day| day.aggregate.levels.iter())
    }
}

/// Fetches the aggregate for every day in `range`.
pub async fn fetch_days(
    client: &Client,
    range: DayRange,
    policy: FetchPolicy,
) -> Result<FetchReport, DayFetchError> {
    let mut report = FetchReport::default();
    tracing::debug!(start = %range.start(), end = %range.end(), days = range.len(), "fetching days");

    for date in range {
        match client.aggregate(date).await {
            Ok(aggregate) => report.days.push(DayRecord { date, aggregate }),
            Err(source) => {
                let error = DayFetchError { date, source };
                match policy {
                    FetchPolicy::Strict => return Err(error),
                    FetchPolicy::BestEffort => {
                        tracing::warn!(%date, error = %error.source, "skipping day");
                        report.failures.push(error);
                    }
                }
            }
        }
    }

    Ok(report)
}
