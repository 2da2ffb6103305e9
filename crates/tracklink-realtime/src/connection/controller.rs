//! Connection controller.
//!
//! Owns the single transport connection and drives the handshake, the
//! subscribe batch, authorization, keepalive and the reconnect policy.
//!
//! All state sits behind one short-lived lock. It is never held across an
//! `.await`, and it is released before user callbacks or the event sink run.
//! Each connect attempt gets a generation number; events from a superseded
//! attempt are ignored.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tracklink_core::config::link::LinkConfig;
use tracklink_core::traits::{
    EventSink, HandshakeClient, LinkEvent, SocketTransport, TransportConnection, TransportEvent,
    TransportSink,
};
use tracklink_core::{AppError, AppResult, Topic};

use crate::message::router::{ControlSignal, MessageRouter};
use crate::message::serializer::{encode_batch, encode_frame};
use crate::message::types::{OutboundFrame, TopicFrameKind};
use crate::metrics::LinkMetrics;
use crate::registry::SubscriptionRegistry;

use super::keepalive::KeepaliveTimer;
use super::state::ConnectionState;

/// Mutable controller state.
#[derive(Debug, Default)]
struct ControllerInner {
    /// Current lifecycle state.
    state: ConnectionState,
    /// Connect URL.
    url: Option<String>,
    /// `Cookie` header for the handshake and the socket.
    cookie_header: Option<String>,
    /// Current connect attempt.
    generation: u64,
    /// Outbound half of the live connection.
    connection: Option<Box<dyn TransportSink>>,
    /// Topics the backend was told about on this connection.
    announced: BTreeSet<Topic>,
    /// Running keepalive.
    keepalive: Option<KeepaliveTimer>,
    /// Pending reconnect.
    reconnect: Option<JoinHandle<()>>,
}

/// Drives the realtime connection on behalf of the facade.
pub struct ConnectionController {
    config: LinkConfig,
    registry: Arc<SubscriptionRegistry>,
    router: MessageRouter,
    transport: Arc<dyn SocketTransport>,
    handshake: Arc<dyn HandshakeClient>,
    sink: Arc<dyn EventSink>,
    metrics: Arc<LinkMetrics>,
    inner: Mutex<ControllerInner>,
}

impl fmt::Debug for ConnectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionController")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionController {
    /// Creates a controller. The URL from `config`, if any, counts as `init`.
    pub fn new(
        config: LinkConfig,
        registry: Arc<SubscriptionRegistry>,
        transport: Arc<dyn SocketTransport>,
        handshake: Arc<dyn HandshakeClient>,
        sink: Arc<dyn EventSink>,
        metrics: Arc<LinkMetrics>,
    ) -> Arc<Self> {
        let router = MessageRouter::new(
            Arc::clone(&registry),
            Arc::clone(&sink),
            Arc::clone(&metrics),
        );
        let inner = ControllerInner {
            url: config.url.clone(),
            ..ControllerInner::default()
        };

        Arc::new(Self {
            config,
            registry,
            router,
            transport,
            handshake,
            sink,
            metrics,
            inner: Mutex::new(inner),
        })
    }

    /// Sets the URL used by subsequent connect attempts.
    pub fn set_url(&self, url: String) {
        self.inner.lock().url = Some(url);
    }

    /// Sets the `Cookie` header used by subsequent connect attempts.
    pub fn set_cookie_header(&self, header: String) {
        self.inner.lock().cookie_header = Some(header);
    }

    /// Whether a connect URL is known.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().url.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Whether a keepalive loop is running.
    pub fn has_keepalive(&self) -> bool {
        self.inner
            .lock()
            .keepalive
            .as_ref()
            .is_some_and(KeepaliveTimer::is_running)
    }

    /// Whether a reconnect is scheduled and has not fired yet.
    pub fn has_pending_reconnect(&self) -> bool {
        self.inner
            .lock()
            .reconnect
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts a connect attempt when `Closed`; otherwise does nothing.
    ///
    /// The subscribe batch is built when the socket reports open, from the
    /// registry as it is at that moment, so topics tracked while the attempt
    /// is in flight are included.
    pub fn ensure_open(self: &Arc<Self>) -> AppResult<()> {
        let (generation, url, cookie_header) = {
            let mut inner = self.inner.lock();
            if inner.state != ConnectionState::Closed {
                debug!(state = %inner.state, "Connection already in progress");
                return Ok(());
            }

            let url = inner.url.clone().ok_or_else(|| {
                AppError::not_initialized("Realtime URL is not set; call init() first")
            })?;

            if let Some(pending) = inner.reconnect.take() {
                pending.abort();
            }
            inner.state = ConnectionState::Connecting;
            inner.generation += 1;
            (inner.generation, url, inner.cookie_header.clone())
        };

        self.metrics.connect_attempt();
        info!(url = %url, generation, "Opening realtime connection");

        tokio::spawn(Arc::clone(self).run_connection(generation, url, cookie_header));
        Ok(())
    }

    /// Sends a single `track`/`untrack` frame when authorized; otherwise the
    /// topic is covered by the next subscribe batch.
    pub fn send_topic_frame(&self, kind: TopicFrameKind, topic: &Topic) {
        let failure = {
            let mut inner = self.inner.lock();
            if inner.state != ConnectionState::OpenAuthorized {
                debug!(topic = %topic, state = %inner.state, "Not authorized, topic frame deferred");
                return;
            }
            match kind {
                TopicFrameKind::Track => {
                    inner.announced.insert(topic.clone());
                }
                TopicFrameKind::Untrack => {
                    inner.announced.remove(topic);
                }
            }
            self.send_locked(&inner, &OutboundFrame::for_topic(kind, topic))
                .err()
        };

        if let Some(e) = failure {
            self.report(LinkEvent::error(format!("send failed: {e}")));
        }
    }

    /// Closes the connection when `intentional`; otherwise does nothing.
    ///
    /// An intentional close is terminal: the keepalive stops, the socket is
    /// closed with the configured code and reason, and no reconnect follows.
    /// The generation is bumped, so the socket's own close notification is
    /// discarded instead of reaching the reconnect policy.
    pub fn request_close(&self, intentional: bool) {
        if !intentional {
            debug!("Non-intentional close request ignored");
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(keepalive) = inner.keepalive.take() {
            keepalive.stop();
        }
        if self.config.cancel_reconnect_when_idle {
            if let Some(pending) = inner.reconnect.take() {
                pending.abort();
                debug!("Pending reconnect cancelled");
            }
        }
        if let Some(connection) = inner.connection.take() {
            connection.close(self.config.close_code, &self.config.close_reason);
        }
        inner.announced.clear();
        inner.generation += 1;

        let previous = std::mem::replace(&mut inner.state, ConnectionState::Closed);
        info!(state = %previous, reason = %self.config.close_reason, "Realtime connection closed intentionally");
    }

    /// Sends a keepalive ping. Returns `false` when not authorized or the
    /// send failed.
    pub(crate) fn send_ping(&self) -> bool {
        let failure = {
            let inner = self.inner.lock();
            if inner.state != ConnectionState::OpenAuthorized {
                return false;
            }
            match self.send_locked(&inner, &OutboundFrame::Ping) {
                Ok(()) => return true,
                Err(e) => e,
            }
        };

        self.report(LinkEvent::error(format!("keepalive failed: {failure}")));
        false
    }

    async fn run_connection(
        self: Arc<Self>,
        generation: u64,
        url: String,
        cookie_header: Option<String>,
    ) {
        let key = match self
            .handshake
            .fetch_connect_key(cookie_header.as_deref())
            .await
        {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "Connect key handshake failed");
                self.abandon(generation);
                self.report(LinkEvent::error(format!("handshake failed: {e}")));
                return;
            }
        };

        if !self.is_current(generation) {
            debug!(generation, "Connect attempt superseded during handshake");
            return;
        }

        let headers: Vec<(String, String)> = cookie_header
            .into_iter()
            .map(|cookie| ("Cookie".to_string(), cookie))
            .collect();

        let TransportConnection {
            sink: outbound,
            mut events,
        } = match self.transport.open(&url, &headers).await {
            Ok(connection) => connection,
            Err(e) => {
                error!(error = %e, url = %url, "Failed to open transport");
                self.abandon(generation);
                self.report(LinkEvent::error(format!("transport error: {e}")));
                return;
            }
        };

        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                outbound.close(self.config.close_code, &self.config.close_reason);
                return;
            }
            inner.connection = Some(outbound);
        }

        while let Some(event) = events.recv().await {
            if !self.is_current(generation) {
                debug!(generation, "Event from superseded connection dropped");
                return;
            }

            match event {
                TransportEvent::Open => self.handle_open(generation, &key),
                TransportEvent::Message(text) => {
                    if self.router.route(&text) == Some(ControlSignal::Authorized) {
                        self.handle_authorized(generation);
                    }
                }
                TransportEvent::Error(message) => {
                    warn!(error = %message, "Transport error");
                    self.report(LinkEvent::error(format!("transport error: {message}")));
                }
                TransportEvent::Close { code, reason } => {
                    self.handle_close(generation, code, &reason);
                    return;
                }
            }
        }

        self.handle_close(generation, None, "event stream ended");
    }

    fn handle_open(&self, generation: u64, key: &str) {
        let failure = {
            let mut inner = self.inner.lock();
            if inner.generation != generation || inner.state != ConnectionState::Connecting {
                return;
            }

            let topics = self.registry.snapshot_topics();
            let sent = encode_batch(key, &topics)
                .map_err(AppError::from)
                .and_then(|batch| self.send_text_locked(&inner, batch));

            inner.state = ConnectionState::OpenUnauthorized;
            info!(topics = topics.len(), "Socket open, subscribe batch sent");
            inner.announced = topics.into_iter().collect();
            sent.err()
        };

        if let Some(e) = failure {
            self.report(LinkEvent::error(format!("send failed: {e}")));
        }
    }

    fn handle_authorized(self: &Arc<Self>, generation: u64) {
        let failures = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }

            match inner.state {
                ConnectionState::OpenUnauthorized => {
                    inner.state = ConnectionState::OpenAuthorized;
                    info!("Realtime connection authorized");
                }
                ConnectionState::OpenAuthorized => {
                    debug!("Repeated authorization ignored");
                }
                other => {
                    warn!(state = %other, "Authorization received in unexpected state");
                    return;
                }
            }

            if !inner.keepalive.as_ref().is_some_and(KeepaliveTimer::is_running) {
                inner.keepalive = Some(KeepaliveTimer::start(
                    Arc::downgrade(self),
                    self.config.keepalive_interval(),
                ));
                debug!(period = ?self.config.keepalive_interval(), "Keepalive started");
            }

            self.reconcile_locked(&mut inner)
        };

        for e in failures {
            self.report(LinkEvent::error(format!("send failed: {e}")));
        }
    }

    /// Catches the backend up with registry changes made between the batch
    /// and authorization.
    fn reconcile_locked(&self, inner: &mut ControllerInner) -> Vec<AppError> {
        let current: BTreeSet<Topic> = self.registry.snapshot_topics().into_iter().collect();
        let added: Vec<Topic> = current.difference(&inner.announced).cloned().collect();
        let removed: Vec<Topic> = inner.announced.difference(&current).cloned().collect();

        let mut failures = Vec::new();
        let frames = added
            .iter()
            .map(|topic| OutboundFrame::for_topic(TopicFrameKind::Track, topic))
            .chain(
                removed
                    .iter()
                    .map(|topic| OutboundFrame::for_topic(TopicFrameKind::Untrack, topic)),
            );
        for frame in frames {
            if let Err(e) = self.send_locked(inner, &frame) {
                failures.push(e);
            }
        }

        if !added.is_empty() || !removed.is_empty() {
            debug!(
                added = added.len(),
                removed = removed.len(),
                "Topics reconciled after authorization"
            );
        }
        inner.announced = current;
        failures
    }

    fn handle_close(self: &Arc<Self>, generation: u64, code: Option<u16>, reason: &str) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(generation, "Close from superseded connection ignored");
            return;
        }

        if let Some(keepalive) = inner.keepalive.take() {
            keepalive.stop();
        }
        inner.connection = None;
        inner.announced.clear();

        let previous = std::mem::replace(&mut inner.state, ConnectionState::Closed);
        if previous == ConnectionState::OpenAuthorized {
            warn!(
                code = ?code,
                reason = %reason,
                "Realtime connection lost, reconnecting in {:?}",
                self.config.reconnect_delay()
            );
            if let Some(pending) = inner.reconnect.take() {
                pending.abort();
            }
            inner.reconnect = Some(self.schedule_reconnect());
            self.metrics.reconnect_scheduled();
        } else {
            info!(code = ?code, reason = %reason, state = %previous, "Realtime connection closed");
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        let delay = self.config.reconnect_delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller.inner.lock().reconnect = None;

            if let Err(e) = controller.ensure_open() {
                warn!(error = %e, "Reconnect could not start");
            }
        })
    }

    /// Returns the controller to `Closed` after a failed attempt.
    fn abandon(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state = ConnectionState::Closed;
            inner.connection = None;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.lock().generation == generation
    }

    fn send_locked(&self, inner: &ControllerInner, frame: &OutboundFrame) -> AppResult<()> {
        let text = encode_frame(frame)?;
        self.send_text_locked(inner, text)?;
        debug!(frame = ?frame, "Frame sent");
        Ok(())
    }

    fn send_text_locked(&self, inner: &ControllerInner, text: String) -> AppResult<()> {
        let connection = inner
            .connection
            .as_ref()
            .ok_or_else(|| AppError::transport("No open connection"))?;
        connection.send(text)?;
        self.metrics.frame_sent();
        Ok(())
    }

    fn report(&self, event: LinkEvent) {
        self.metrics.error_reported();
        self.sink.emit(event);
    }
}
