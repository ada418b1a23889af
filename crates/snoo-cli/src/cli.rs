//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use snoo_api::FetchPolicy;
use snoo_core::DayRange;

use crate::render::Format;

/// An API client for the SNOO Smart Sleeper Bassinet.
///
/// Exports daily sleep totals and reconstructed sleep sessions as CSV.
#[derive(Debug, Parser)]
#[command(name = "snoo", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debugging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SNOO login username (overrides `SNOO_USERNAME`).
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// SNOO login password (overrides `SNOO_PASSWORD`).
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print sessions for a date range.
    Sessions(RangeArgs),

    /// Print daily aggregated totals for a date range.
    Days(RangeArgs),

    /// Print the current status of the bassinet as JSON.
    Status,
}

/// Options shared by the range exports.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// First day to export (YYYY-MM-DD).
    #[arg(short, long)]
    pub start: NaiveDate,

    /// Last day to export, inclusive (YYYY-MM-DD).
    #[arg(short, long)]
    pub end: NaiveDate,

    /// Skip days that fail to fetch instead of aborting.
    #[arg(long)]
    pub keep_going: bool,

    /// Output JSON instead of CSV.
    #[arg(long)]
    pub json: bool,
}

impl RangeArgs {
    pub const fn range(&self) -> DayRange {
        DayRange::new(self.start, self.end)
    }

    pub const fn policy(&self) -> FetchPolicy {
        if self.keep_going {
            FetchPolicy::BestEffort
        } else {
            FetchPolicy::Strict
        }
    }

    pub const fn format(&self) -> Format {
        if self.json { Format::Json } else { Format::Csv }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sessions_range() {
        let cli = Cli::try_parse_from([
            "snoo",
            "sessions",
            "--start",
            "2020-08-24",
            "--end",
            "2020-08-25",
        ])
        .unwrap();

        let Some(Commands::Sessions(args)) = cli.command else {
            panic!("expected sessions command");
        };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2020, 8, 24).unwrap());
        assert_eq!(args.range().len(), 2);
        assert_eq!(args.policy(), FetchPolicy::Strict);
        assert_eq!(args.format(), Format::Csv);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "snoo",
            "days",
            "-s",
            "2020-08-24",
            "-e",
            "2020-08-24",
            "--keep-going",
            "--json",
            "-u",
            "parent@example.com",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.username.as_deref(), Some("parent@example.com"));
        let Some(Commands::Days(args)) = cli.command else {
            panic!("expected days command");
        };
        assert_eq!(args.policy(), FetchPolicy::BestEffort);
        assert_eq!(args.format(), Format::Json);
    }

    #[test]
    fn rejects_malformed_dates() {
        let result = Cli::try_parse_from([
            "snoo",
            "sessions",
            "--start",
            "08/24/2020",
            "--end",
            "2020-08-25",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn range_requires_both_ends() {
        let result = Cli::try_parse_from(["snoo", "days", "--start", "2020-08-24"]);
        assert!(result.is_err());
    }
}
