//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the connector using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// PEC Connector - e-SUS PEC production sync
#[derive(Parser, Debug)]
#[command(name = "pec-connector")]
#[command(version, about, long_about = None)]
#[command(author = "PEC Connector Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pec-connector.toml", env = "PEC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PEC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler until interrupted
    Run(commands::run::RunArgs),

    /// Run one sync cycle now and exit
    Sync(commands::sync::SyncArgs),

    /// Check database and ingestion endpoint connectivity
    Check(commands::check::CheckArgs),

    /// Show watermark and recent run history
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
