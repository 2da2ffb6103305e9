//! Link metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for one realtime client.
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// Outbound frames handed to the transport (a batch counts once)
    pub frames_sent: AtomicU64,
    /// Inbound frames received
    pub frames_received: AtomicU64,
    /// Connect attempts started
    pub connect_attempts: AtomicU64,
    /// Reconnects scheduled after unexpected closes
    pub reconnects_scheduled: AtomicU64,
    /// Errors reported to the event sink
    pub errors_reported: AtomicU64,
}

impl LinkMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outbound frame
    pub fn frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound frame
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connect attempt
    pub fn connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a scheduled reconnect
    pub fn reconnect_scheduled(&self) {
        self.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error handed to the sink
    pub fn error_reported(&self) {
        self.errors_reported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
            errors_reported: self.errors_reported.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Outbound frames handed to the transport
    pub frames_sent: u64,
    /// Inbound frames received
    pub frames_received: u64,
    /// Connect attempts started
    pub connect_attempts: u64,
    /// Reconnects scheduled
    pub reconnects_scheduled: u64,
    /// Errors reported
    pub errors_reported: u64,
}
