//! Status command for showing what the bassinet is doing right now.

use std::io::Write;

use anyhow::{Context, Result};
use snoo_api::Client;

pub async fn run<W: Write>(writer: &mut W, client: &Client) -> Result<()> {
    let status = client
        .status()
        .await
        .context("failed to fetch current status")?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&status)?)?;
    Ok(())
}
