//! Realtime client facade.

use std::sync::Arc;

use tracing::{debug, info};

use tracklink_core::config::AppConfig;
use tracklink_core::config::link::LinkConfig;
use tracklink_core::traits::{EventSink, HandshakeClient, SocketTransport};
use tracklink_core::types::build_cookie_header;
use tracklink_core::{AppError, AppResult, Topic};

use crate::connection::controller::ConnectionController;
use crate::connection::state::ConnectionState;
use crate::handshake::HttpHandshakeClient;
use crate::message::types::TopicFrameKind;
use crate::metrics::{LinkMetrics, MetricsSnapshot};
use crate::registry::{SubscriptionRegistry, TopicCallback};
use crate::transport::WsTransport;

/// Public entry point: `cookies`, `init`, `track`, `untrack`.
///
/// Cloning is cheap; every clone drives the same connection and registry.
/// The connection is opened lazily by the first `track` and closed once
/// the last callback is untracked.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    /// Topic callbacks.
    registry: Arc<SubscriptionRegistry>,
    /// Connection lifecycle.
    controller: Arc<ConnectionController>,
    /// Link counters.
    metrics: Arc<LinkMetrics>,
}

impl RealtimeClient {
    /// Creates a client around the given collaborators.
    pub fn new(
        config: LinkConfig,
        transport: Arc<dyn SocketTransport>,
        handshake: Arc<dyn HandshakeClient>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let metrics = Arc::new(LinkMetrics::new());
        let controller = ConnectionController::new(
            config,
            Arc::clone(&registry),
            transport,
            handshake,
            sink,
            Arc::clone(&metrics),
        );

        Self {
            registry,
            controller,
            metrics,
        }
    }

    /// Builds a client wired to the WebSocket transport and the HTTP
    /// handshake, with session cookies applied and the URL initialized.
    pub fn from_config(config: &AppConfig, sink: Arc<dyn EventSink>) -> AppResult<Self> {
        let url = config
            .link
            .url
            .clone()
            .ok_or_else(|| AppError::configuration("link.url is not set"))?;
        let handshake = HttpHandshakeClient::from_config(&config.link)?;
        let transport = WsTransport::new(config.link.event_buffer_size);

        let client = Self::new(
            config.link.clone(),
            Arc::new(transport),
            Arc::new(handshake),
            sink,
        );
        if !config.session.cookies.is_empty() {
            client.cookies(&config.session.cookies);
        }
        client.init(url);
        Ok(client)
    }

    /// Stores session cookies for the handshake and socket upgrade.
    ///
    /// Values are percent-encoded and joined as `name=value; name=value`.
    /// The resulting header is returned. Takes effect on the next connect.
    pub fn cookies<I, K, V>(&self, cookies: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let header = build_cookie_header(cookies);
        self.controller.set_cookie_header(header.clone());
        header
    }

    /// Sets the realtime URL. Must be called before the first `track`.
    pub fn init(&self, url: impl Into<String>) {
        let url = url.into();
        info!(url = %url, "Realtime client initialized");
        self.controller.set_url(url);
    }

    /// Registers `callback` for `topic`.
    ///
    /// Opens the connection if it is closed, or sends a `track` frame right
    /// away if it is authorized. Fails without touching the registry when
    /// `init` has not been called.
    pub fn track(&self, topic: Topic, callback: TopicCallback) -> AppResult<()> {
        if !self.controller.is_initialized() {
            return Err(AppError::not_initialized(
                "Realtime URL is not set; call init() first",
            ));
        }

        debug!(topic = %topic, "Tracking topic");
        self.registry.add_callback(topic.clone(), callback);

        match self.controller.state() {
            ConnectionState::Closed => self.controller.ensure_open()?,
            ConnectionState::OpenAuthorized => self
                .controller
                .send_topic_frame(TopicFrameKind::Track, &topic),
            ConnectionState::Connecting | ConnectionState::OpenUnauthorized => {}
        }
        Ok(())
    }

    /// Removes one registration of `callback` from `topic`.
    ///
    /// Returns `false` when the callback was not registered. Sends `untrack`
    /// once the topic has no callbacks left, and closes the connection once
    /// the registry is empty.
    pub fn untrack(&self, topic: &Topic, callback: &TopicCallback) -> bool {
        let Some(removal) = self.registry.remove_callback(topic, callback) else {
            debug!(topic = %topic, "Untrack of unknown callback ignored");
            return false;
        };

        if removal.topic_empty {
            debug!(topic = %topic, service_empty = removal.service_empty, "Topic has no callbacks left");
            self.controller
                .send_topic_frame(TopicFrameKind::Untrack, topic);
        }
        if removal.registry_empty {
            self.controller.request_close(true);
        }
        true
    }

    /// Drops every subscription and closes the connection for good.
    pub fn shutdown(&self) {
        let dropped = self.registry.clear();
        info!(topics = dropped, "Realtime client shutting down");
        self.controller.request_close(true);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    /// Registered topics in iteration order.
    pub fn topics(&self) -> Vec<Topic> {
        self.registry.snapshot_topics()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The underlying connection controller.
    pub fn controller(&self) -> &Arc<ConnectionController> {
        &self.controller
    }
}
