//! Tracklink agent.
//!
//! Loads configuration, tracks every configured subscription, and prints
//! each topic event as one JSON line on stdout until Ctrl+C or SIGTERM.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

use tracklink_core::config::AppConfig;
use tracklink_core::error::AppError;
use tracklink_core::traits::LinkEvent;
use tracklink_realtime::sink::BroadcastSink;
use tracklink_realtime::{RealtimeClient, TopicCallback};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Agent error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `TRACKLINK_CONFIG`, or from the layered
/// `config/` directory for `TRACKLINK_ENV`.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("TRACKLINK_CONFIG") {
        Ok(path) => AppConfig::load_from(&path),
        Err(_) => {
            let env = std::env::var("TRACKLINK_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting tracklink agent v{}", env!("CARGO_PKG_VERSION"));

    if config.subscriptions.is_empty() {
        return Err(AppError::configuration(
            "No subscriptions configured; add [[subscriptions]] entries",
        ));
    }

    let sink = Arc::new(BroadcastSink::new(config.link.event_buffer_size));
    let mut link_events = sink.subscribe();
    let client = RealtimeClient::from_config(&config, sink)?;

    for subscription in &config.subscriptions {
        let topic = subscription.topic();
        let label = topic.to_string();
        client.track(
            topic,
            TopicCallback::new(move |payload: &Value| print_event(&label, payload)),
        )?;
    }
    tracing::info!(
        topics = config.subscriptions.len(),
        "Tracking configured subscriptions"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            event = link_events.recv() => match event {
                Ok(LinkEvent::Error { code, message, .. }) => {
                    tracing::warn!(code = ?code, "Link error: {}", message);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Link event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.shutdown();
    tracing::info!(metrics = ?client.metrics(), "Agent stopped");
    Ok(())
}

fn print_event(topic: &str, payload: &Value) {
    println!(
        "{}",
        json!({
            "topic": topic,
            "received_at": Utc::now(),
            "data": payload,
        })
    );
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
