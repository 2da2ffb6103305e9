//! Application-facing event sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification emitted by the realtime core to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkEvent {
    /// Something went wrong: transport failure, protocol violation, or a
    /// backend-reported error.
    Error {
        /// Backend error code, when the backend supplied one.
        code: Option<i64>,
        /// Human-readable description.
        message: String,
        /// When the error was observed.
        timestamp: DateTime<Utc>,
    },
}

impl LinkEvent {
    /// Builds an error event without a backend code.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            code: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Builds an error event for a backend-reported error.
    pub fn backend_error(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Fire-and-forget receiver of [`LinkEvent`]s.
pub trait EventSink: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one event. Must not block.
    fn emit(&self, event: LinkEvent);
}
