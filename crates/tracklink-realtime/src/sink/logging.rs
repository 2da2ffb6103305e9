//! Sink that only logs.

use tracklink_core::traits::{EventSink, LinkEvent};

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: LinkEvent) {
        match event {
            LinkEvent::Error { code, message, .. } => {
                tracing::error!(code = ?code, "Realtime link error: {}", message);
            }
        }
    }
}
