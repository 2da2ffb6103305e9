//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use super::Cli;
use crate::output::{self, OutputFormat};
use tracklink_core::Topic;
use tracklink_core::config::AppConfig;
use tracklink_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, cli: &Cli, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = cli.load_config()?;
            match format {
                OutputFormat::Json => output::print_json(&masked(config))?,
                OutputFormat::Table => print_summary(&config),
            }
        }
        ConfigCommand::Validate => {
            let config = validate(cli.load_config()?)?;
            output::print_done(&format!(
                "Configuration '{}' is valid",
                cli.config_source()
            ));
            print_summary(&config);
        }
    }

    Ok(())
}

/// Checks what the agent needs before it can connect.
fn validate(config: AppConfig) -> Result<AppConfig, AppError> {
    let link = &config.link;
    match link.url.as_deref() {
        Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => {}
        Some(url) => {
            return Err(AppError::configuration(format!(
                "link.url must be a ws:// or wss:// URL, got '{}'",
                url
            )));
        }
        None => return Err(AppError::configuration("link.url is not set")),
    }
    if link.handshake_url.is_none() {
        return Err(AppError::configuration("link.handshake_url is not set"));
    }
    if link.keepalive_interval_seconds == 0 || link.reconnect_delay_seconds == 0 {
        return Err(AppError::configuration(
            "link.keepalive_interval_seconds and link.reconnect_delay_seconds must be positive",
        ));
    }
    for subscription in &config.subscriptions {
        if subscription.service.is_empty() || subscription.key.is_empty() {
            return Err(AppError::configuration(
                "subscriptions entries need a non-empty service and key",
            ));
        }
    }
    Ok(config)
}

fn print_summary(config: &AppConfig) {
    let link = &config.link;
    output::print_setting("URL", link.url.as_deref().unwrap_or("(unset)"));
    output::print_setting(
        "Handshake URL",
        link.handshake_url.as_deref().unwrap_or("(unset)"),
    );
    output::print_setting(
        "Keepalive",
        &format!("{}s", link.keepalive_interval_seconds),
    );
    output::print_setting("Reconnect delay", &format!("{}s", link.reconnect_delay_seconds));
    output::print_setting(
        "Cancel idle reconnect",
        &link.cancel_reconnect_when_idle.to_string(),
    );
    output::print_setting("Cookies", &config.session.cookies.len().to_string());
    output::print_setting(
        "Logging",
        &format!("{} ({})", config.logging.level, config.logging.format),
    );

    let topics: Vec<Topic> = config
        .subscriptions
        .iter()
        .map(|s| Topic::new(s.service.clone(), s.key.clone()))
        .collect();
    println!("{}", output::topic_table(&topics));
}

/// Hides cookie values before printing.
fn masked(mut config: AppConfig) -> AppConfig {
    for value in config.session.cookies.values_mut() {
        *value = "****".to_string();
    }
    config
}
