//! Implementation of the `snoo days` command.

use std::io::Write;

use anyhow::{Context, Result};
use snoo_api::Client;

use super::util::fetch_range;
use crate::RangeArgs;
use crate::render::{DayRow, write_rows};

/// Prints the server's daily totals, one row per requested day.
pub async fn run<W: Write>(writer: &mut W, client: &Client, args: &RangeArgs) -> Result<()> {
    let report = fetch_range(client, args).await?;

    let rows: Vec<DayRow<'_>> = report.days.iter().map(DayRow::from).collect();
    write_rows(writer, &rows, args.format()).context("failed to write days")?;
    Ok(())
}
