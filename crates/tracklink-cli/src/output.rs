//! Terminal rendering for CLI commands.
//!
//! Results and topic events go to stdout; status lines for humans go to
//! stderr so `watch` output can be piped.

use serde::Serialize;
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use tracklink_core::{AppResult, Topic};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Tabled)]
struct TopicRow<'a> {
    service: &'a str,
    key: &'a str,
}

/// Renders topics as a two-column table.
pub fn topic_table(topics: &[Topic]) -> String {
    if topics.is_empty() {
        return "(no subscriptions)".to_string();
    }
    let rows = topics.iter().map(|topic| TopicRow {
        service: &topic.service,
        key: &topic.key,
    });
    Table::new(rows).with(Style::modern()).to_string()
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One topic event as a single JSON line.
pub fn event_line(topic: &Topic, payload: &Value) -> String {
    json!({ "topic": topic.to_string(), "data": payload }).to_string()
}

/// Prints a labelled setting, aligned.
pub fn print_setting(label: &str, value: &str) {
    println!("  {:<24} {}", format!("{label}:"), value);
}

/// Status line for a finished operation.
pub fn print_done(msg: &str) {
    eprintln!("✓ {msg}");
}

/// Status line for a failed operation.
pub fn print_failure(msg: &str) {
    eprintln!("✗ {msg}");
}
