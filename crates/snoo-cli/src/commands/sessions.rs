//! Implementation of the `snoo sessions` command.
//!
//! Fetches every day in the range, folds all levels into sessions and prints
//! one row per session, oldest first.

use std::io::Write;

use anyhow::{Context, Result};
use snoo_api::Client;
use snoo_core::reconstruct_sessions;

use super::util::fetch_range;
use crate::RangeArgs;
use crate::render::{SessionRow, write_rows};

pub async fn run<W: Write>(writer: &mut W, client: &Client, args: &RangeArgs) -> Result<()> {
    let report = fetch_range(client, args).await?;

    // Sessions that cross midnight show up in two aggregates; reconstruct
    // only once every day is in.
    let sessions = reconstruct_sessions(report.levels());

    let rows: Vec<SessionRow<'_>> = sessions.iter().map(SessionRow::from).collect();
    write_rows(writer, &rows, args.format()).context("failed to write sessions")?;
    Ok(())
}
