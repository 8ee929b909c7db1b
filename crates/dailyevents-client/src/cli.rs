//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// daily-events - Home Assistant calendar digests
#[derive(Debug, Parser)]
#[command(name = "daily-events")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DAILY_EVENTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Configuration file in effect: `--config` or the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::ClientConfig::default_path)
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build today's digest and send it to every channel (default)
    Notify {
        /// Number of days covered, overriding the configuration
        #[arg(long, short, value_parser = clap::value_parser!(u32).range(0..=366))]
        days: Option<u32>,

        /// Print the digest instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// List the calendars of the Home Assistant instance
    Calendars,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
