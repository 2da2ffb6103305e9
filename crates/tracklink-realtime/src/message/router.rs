//! Inbound frame router.

use std::sync::Arc;

use tracing::{debug, warn};

use tracklink_core::Topic;
use tracklink_core::traits::{EventSink, LinkEvent};

use crate::metrics::LinkMetrics;
use crate::registry::SubscriptionRegistry;

use super::serializer::decode_inbound;
use super::types::{AUTHORIZED, InboundFrame, PONG};

/// Control signals the router hands back to the connection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// The backend accepted the connect key.
    Authorized,
}

/// Decodes inbound frames and dispatches them.
///
/// Topic data goes to the registry, errors and protocol violations go to
/// the event sink, and connection control is returned to the caller.
#[derive(Debug)]
pub struct MessageRouter {
    registry: Arc<SubscriptionRegistry>,
    sink: Arc<dyn EventSink>,
    metrics: Arc<LinkMetrics>,
}

impl MessageRouter {
    /// Creates a router.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        sink: Arc<dyn EventSink>,
        metrics: Arc<LinkMetrics>,
    ) -> Self {
        Self {
            registry,
            sink,
            metrics,
        }
    }

    /// Routes one raw inbound frame.
    pub fn route(&self, raw: &str) -> Option<ControlSignal> {
        self.metrics.frame_received();

        let frame = match decode_inbound(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Undecodable inbound frame");
                self.report(LinkEvent::error(format!("unknown data: {raw}")));
                return None;
            }
        };

        match frame {
            InboundFrame::Control(control) if control == AUTHORIZED => {
                Some(ControlSignal::Authorized)
            }
            InboundFrame::Control(control) if control == PONG => {
                debug!("Pong received");
                None
            }
            InboundFrame::Control(other) => {
                warn!(control = %other, "Unknown control string");
                self.report(LinkEvent::error(format!("unknown data: {other}")));
                None
            }
            InboundFrame::Error { error } => {
                warn!(code = ?error.code, msg = %error.msg, "Backend reported an error");
                self.report(LinkEvent::backend_error(error.code, error.msg));
                None
            }
            InboundFrame::Data { service, key, data } => {
                let topic = Topic::new(service, key);
                let delivered = self.registry.dispatch(&topic, &data);
                debug!(topic = %topic, delivered, "Topic event dispatched");
                None
            }
        }
    }

    fn report(&self, event: LinkEvent) {
        self.metrics.error_reported();
        self.sink.emit(event);
    }
}
