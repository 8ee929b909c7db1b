//! daily-events CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use dailyevents_client::cli::{Cli, Command, ConfigAction};
use dailyevents_client::commands;
use dailyevents_client::config::ClientConfig;
use dailyevents_client::error::{ClientError, ClientResult};
use dailyevents_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    let tracing_config = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match cli.command {
        Some(Command::Config { ref action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &cli.config_path()),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&cli.config_path()),
        },
        Some(Command::Calendars) => {
            let resolved = config.resolve().map_err(ClientError::Config)?;
            commands::calendars::list(resolved).await
        }
        Some(Command::Notify { days, dry_run }) => {
            let resolved = config.resolve().map_err(ClientError::Config)?;
            commands::notify::run(resolved, days, dry_run).await
        }
        None => {
            let resolved = config.resolve().map_err(ClientError::Config)?;
            commands::notify::run(resolved, None, false).await
        }
    }
}
