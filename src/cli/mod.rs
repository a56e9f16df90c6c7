//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for practice-store using clap.

pub mod commands;

use crate::config::{load_config, LoggingConfig};
use clap::{Parser, Subcommand};

/// practice-store - visit persistence with referential auto-repair
#[derive(Parser, Debug)]
#[command(name = "practice-store")]
#[command(version, about, long_about = None)]
#[command(author = "practice-store Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "practice.toml", env = "PRACTICE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PRACTICE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level and layers for this run
    ///
    /// `--log-level` wins over `[application] log_level`. When the config file
    /// is missing or invalid the run logs to the console at `info`; the command
    /// itself reports the config problem.
    pub fn logging_settings(&self) -> (String, LoggingConfig) {
        match load_config(&self.config) {
            Ok(config) => (
                self.log_level
                    .clone()
                    .unwrap_or(config.application.log_level),
                config.logging,
            ),
            Err(_) => (
                self.log_level.clone().unwrap_or_else(|| "info".to_string()),
                LoggingConfig::console_only(),
            ),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Create the tables in the configured store
    Migrate(commands::migrate::MigrateArgs),

    /// Test the connection and show row counts
    Status(commands::status::StatusArgs),

    /// Upsert billables from a JSON price list
    ImportBillables(commands::import::ImportArgs),

    /// Create, show, list or delete visits
    Visit(commands::visit::VisitArgs),

    /// Export visit images
    Image(commands::image::ImageArgs),
}
