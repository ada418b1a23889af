use std::io::{BufWriter, Write, stdout};

use anyhow::{Context, Result};
use clap::Parser;
use snoo_api::Client;
use tracing_subscriber::EnvFilter;

use snoo_cli::commands::{days, sessions, status};
use snoo_cli::{Cli, Commands, Config};

/// Load config, apply command-line credentials and build the API client.
fn build_client(cli: &Cli) -> Result<Client> {
    let config = Config::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.username.clone(), cli.password.clone());
    tracing::debug!(?config, "loaded configuration");

    let credentials = config.credentials()?;
    Client::with_options(credentials, config.client_options()?)
        .context("failed to create API client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so CSV on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let client = build_client(&cli)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let stdout = stdout();
    let mut writer = BufWriter::new(stdout.lock());
    runtime.block_on(async {
        match command {
            Commands::Sessions(args) => sessions::run(&mut writer, &client, args).await,
            Commands::Days(args) => days::run(&mut writer, &client, args).await,
            Commands::Status => status::run(&mut writer, &client).await,
        }
    })?;
    writer.flush().context("failed to flush output")?;

    Ok(())
}
