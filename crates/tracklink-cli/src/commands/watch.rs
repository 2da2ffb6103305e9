//! Watch command: track ad hoc topics and stream their events.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::Value;

use crate::output;
use tracklink_core::Topic;
use tracklink_core::config::AppConfig;
use tracklink_core::error::AppError;
use tracklink_realtime::sink::TracingSink;
use tracklink_realtime::{RealtimeClient, TopicCallback};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Topics to track, as `service/key`
    #[arg(required = true)]
    pub topics: Vec<Topic>,

    /// Realtime URL (overrides `link.url`)
    #[arg(long)]
    pub url: Option<String>,

    /// Handshake URL (overrides `link.handshake_url`)
    #[arg(long)]
    pub handshake_url: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    pub seconds: Option<u64>,
}

/// Track the requested topics until Ctrl+C or the timeout
pub async fn execute(args: &WatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let mut config = config.clone();
    if let Some(url) = &args.url {
        config.link.url = Some(url.clone());
    }
    if let Some(handshake_url) = &args.handshake_url {
        config.link.handshake_url = Some(handshake_url.clone());
    }

    let client = RealtimeClient::from_config(&config, Arc::new(TracingSink))?;

    for topic in &args.topics {
        let label = topic.clone();
        client.track(
            topic.clone(),
            TopicCallback::new(move |payload: &Value| {
                println!("{}", output::event_line(&label, payload));
            }),
        )?;
    }
    tracing::info!(topics = args.topics.len(), "Watching topics");

    match args.seconds {
        Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| AppError::internal(format!("Failed to listen for Ctrl+C: {}", e)))?;
        }
    }

    let metrics = client.metrics();
    client.shutdown();
    output::print_done(&format!(
        "Stopped after {} frames received, {} reconnects",
        metrics.frames_received, metrics.reconnects_scheduled
    ));
    Ok(())
}
