//! CLI command definitions and dispatch.

pub mod config;
pub mod cookie;
pub mod watch;

use clap::{ArgAction, Parser, Subcommand};

use crate::output::OutputFormat;
use tracklink_core::config::AppConfig;
use tracklink_core::error::AppError;

/// Tracklink realtime topic client
#[derive(Debug, Parser)]
#[command(name = "tracklink", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (overrides the layered `config/` directory)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Environment overlay loaded from `config/{env}`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Raise log verbosity (`-v` info, `-vv` debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track topics and print their events as JSON lines
    Watch(watch::WatchArgs),
    /// Build a Cookie header from name=value pairs
    Cookie(cookie::CookieArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Watch(args) => watch::execute(args, &self.load_config()?).await,
            Commands::Cookie(args) => cookie::execute(args, self.format),
            Commands::Config(args) => config::execute(args, self, self.format),
        }
    }

    /// Load configuration from `--config` or the layered directory
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(&self.env),
        }
    }

    /// Human-readable description of where configuration comes from
    pub fn config_source(&self) -> String {
        match &self.config {
            Some(path) => path.clone(),
            None => format!("config/default + config/{}", self.env),
        }
    }
}
