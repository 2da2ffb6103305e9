//! In-process fan-out of link events.

use tokio::sync::broadcast;

use tracklink_core::traits::{EventSink, LinkEvent};

/// Publishes events on a broadcast channel so any number of application
/// components can listen. Events emitted while nobody listens are dropped.
#[derive(Debug)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LinkEvent>,
}

impl BroadcastSink {
    /// Create a sink buffering up to `buffer_size` events per receiver
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: LinkEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Link event dropped, no listeners");
        }
    }
}
