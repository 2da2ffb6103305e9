//! Realtime link configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the multiplexed realtime connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// WebSocket URL of the realtime backend.
    #[serde(default)]
    pub url: Option<String>,
    /// HTTP endpoint returning the one-time connect key.
    #[serde(default)]
    pub handshake_url: Option<String>,
    /// Interval between keepalive pings once authorized, in seconds.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_seconds: u64,
    /// Delay before reconnecting after an unexpected close, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_seconds: u64,
    /// Close code sent when nothing is tracked anymore.
    #[serde(default = "default_close_code")]
    pub close_code: u16,
    /// Close reason sent when nothing is tracked anymore.
    #[serde(default = "default_close_reason")]
    pub close_reason: String,
    /// Buffer size of the transport event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
    /// Cancel a pending reconnect when the last topic is untracked.
    #[serde(default = "default_true")]
    pub cancel_reconnect_when_idle: bool,
}

impl LinkConfig {
    /// Keepalive period as a [`Duration`].
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_seconds)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            url: None,
            handshake_url: None,
            keepalive_interval_seconds: default_keepalive_interval(),
            reconnect_delay_seconds: default_reconnect_delay(),
            close_code: default_close_code(),
            close_reason: default_close_reason(),
            event_buffer_size: default_event_buffer(),
            cancel_reconnect_when_idle: true,
        }
    }
}

fn default_keepalive_interval() -> u64 {
    300
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_close_code() -> u16 {
    1000
}

fn default_close_reason() -> String {
    "nothing else to track".to_string()
}

fn default_event_buffer() -> usize {
    256
}

fn default_true() -> bool {
    true
}
