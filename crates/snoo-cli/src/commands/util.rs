//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use snoo_api::{Client, FetchReport, fetch_days};

use crate::RangeArgs;

/// Fetch every day in the requested range under the requested policy.
///
/// Days skipped under `--keep-going` are listed on stderr so they are not
/// mistaken for days without data.
pub async fn fetch_range(client: &Client, args: &RangeArgs) -> Result<FetchReport> {
    let report = fetch_days(client, args.range(), args.policy())
        .await
        .context("failed to fetch daily aggregates")?;

    if !report.failures.is_empty() {
        eprintln!("Warning: skipped {} day(s):", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.date, failure.source);
        }
    }

    Ok(report)
}
