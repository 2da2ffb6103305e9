//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use tracklink_core::config::link::LinkConfig;
use tracklink_core::traits::{
    EventSink, HandshakeClient, LinkEvent, SocketTransport, TransportConnection, TransportEvent,
    TransportSink,
};
use tracklink_core::{AppError, AppResult, Topic};
use tracklink_realtime::{RealtimeClient, TopicCallback};

pub const TEST_URL: &str = "ws://realtime.test/socket";

/// Handshake that hands out `key-1`, `key-2`, ... and can be told to fail.
#[derive(Debug, Default)]
pub struct MockHandshake {
    calls: AtomicUsize,
    fail: AtomicBool,
    cookies: Mutex<Vec<Option<String>>>,
}

impl MockHandshake {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn cookies(&self) -> Vec<Option<String>> {
        self.cookies.lock().clone()
    }
}

#[async_trait]
impl HandshakeClient for MockHandshake {
    async fn fetch_connect_key(&self, cookie_header: Option<&str>) -> AppResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.cookies.lock().push(cookie_header.map(str::to_string));
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::handshake("connect key request returned 500"));
        }
        Ok(format!("key-{call}"))
    }
}

/// One connection handed out by [`MockTransport`]; the test plays the
/// backend through it.
#[derive(Debug)]
pub struct MockConnection {
    pub url: String,
    pub headers: Vec<(String, String)>,
    sent: Mutex<Vec<String>>,
    closes: Mutex<Vec<(u16, String)>>,
    open: AtomicBool,
    events: mpsc::Sender<TransportEvent>,
}

impl MockConnection {
    /// Socket finished opening.
    pub async fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        let _ = self.events.send(TransportEvent::Open).await;
        settle().await;
    }

    /// Backend sends a raw text frame.
    pub async fn deliver(&self, text: &str) {
        let _ = self
            .events
            .send(TransportEvent::Message(text.to_string()))
            .await;
        settle().await;
    }

    /// Backend confirms the connect key.
    pub async fn authorize(&self) {
        self.deliver(r#""authorized""#).await;
    }

    /// Transport reports an error.
    pub async fn fail(&self, message: &str) {
        let _ = self
            .events
            .send(TransportEvent::Error(message.to_string()))
            .await;
        settle().await;
    }

    /// Socket closes without being asked to.
    pub async fn drop_remote(&self, code: u16) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self
            .events
            .send(TransportEvent::Close {
                code: Some(code),
                reason: "going away".to_string(),
            })
            .await;
        settle().await;
    }

    /// Raw outbound texts in send order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Outbound texts parsed as JSON.
    pub fn sent_frames(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|text| serde_json::from_str(text).expect("outbound frame is JSON"))
            .collect()
    }

    /// Number of pings sent.
    pub fn pings(&self) -> usize {
        self.sent_frames()
            .iter()
            .filter(|frame| frame["_type"] == "ping")
            .count()
    }

    /// Close requests received from the client.
    pub fn closes(&self) -> Vec<(u16, String)> {
        self.closes.lock().clone()
    }
}

#[derive(Debug)]
struct MockSink(Arc<MockConnection>);

impl TransportSink for MockSink {
    fn send(&self, text: String) -> AppResult<()> {
        if !self.is_open() {
            return Err(AppError::transport("Socket is not open"));
        }
        self.0.sent.lock().push(text);
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        self.0.open.store(false, Ordering::SeqCst);
        self.0.closes.lock().push((code, reason.to_string()));
    }

    fn is_open(&self) -> bool {
        self.0.open.load(Ordering::SeqCst)
    }
}

/// Transport that records every connection it opens.
#[derive(Debug, Default)]
pub struct MockTransport {
    connections: Mutex<Vec<Arc<MockConnection>>>,
}

impl MockTransport {
    pub fn opens(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn connection(&self, index: usize) -> Arc<MockConnection> {
        Arc::clone(&self.connections.lock()[index])
    }

    pub fn last(&self) -> Arc<MockConnection> {
        Arc::clone(self.connections.lock().last().expect("no connection opened"))
    }
}

#[async_trait]
impl SocketTransport for MockTransport {
    async fn open(&self, url: &str, headers: &[(String, String)]) -> AppResult<TransportConnection> {
        let (tx, rx) = mpsc::channel(64);
        let connection = Arc::new(MockConnection {
            url: url.to_string(),
            headers: headers.to_vec(),
            sent: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            open: AtomicBool::new(false),
            events: tx,
        });
        self.connections.lock().push(Arc::clone(&connection));

        Ok(TransportConnection {
            sink: Box::new(MockSink(connection)),
            events: rx,
        })
    }
}

/// Sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LinkEvent>>,
}

impl RecordingSink {
    /// `(code, message)` of every error event.
    pub fn errors(&self) -> Vec<(Option<i64>, String)> {
        self.events
            .lock()
            .iter()
            .map(|event| match event {
                LinkEvent::Error { code, message, .. } => (*code, message.clone()),
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: LinkEvent) {
        self.events.lock().push(event);
    }
}

/// Collects callback invocations as `(label, payload)`.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    pub fn callback(&self, label: &str) -> TopicCallback {
        let calls = Arc::clone(&self.calls);
        let label = label.to_string();
        TopicCallback::new(move |payload: &Value| calls.lock().push((label.clone(), payload.clone())))
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(label, _)| label.clone()).collect()
    }
}

/// A client wired to mock collaborators.
pub struct Harness {
    pub client: RealtimeClient,
    pub transport: Arc<MockTransport>,
    pub handshake: Arc<MockHandshake>,
    pub sink: Arc<RecordingSink>,
    pub recorder: Recorder,
}

impl Harness {
    /// Client that has not been initialized.
    pub fn new() -> Self {
        Self::with_config(LinkConfig::default())
    }

    pub fn with_config(config: LinkConfig) -> Self {
        let transport = Arc::new(MockTransport::default());
        let handshake = Arc::new(MockHandshake::default());
        let sink = Arc::new(RecordingSink::default());
        let client = RealtimeClient::new(
            config,
            transport.clone(),
            handshake.clone(),
            sink.clone(),
        );

        Self {
            client,
            transport,
            handshake,
            sink,
            recorder: Recorder::default(),
        }
    }

    /// Client with the test URL set.
    pub fn initialized() -> Self {
        let harness = Self::new();
        harness.client.init(TEST_URL);
        harness
    }

    /// Tracks `topic` with a recording callback labelled `label`.
    pub async fn track(&self, topic: &Topic, label: &str) -> TopicCallback {
        let callback = self.recorder.callback(label);
        self.client
            .track(topic.clone(), callback.clone())
            .expect("track");
        settle().await;
        callback
    }

    /// Tracks `topics`, then opens and authorizes the connection.
    pub async fn authorized(&self, topics: &[Topic]) -> (Arc<MockConnection>, Vec<TopicCallback>) {
        let mut callbacks = Vec::new();
        for (i, topic) in topics.iter().enumerate() {
            callbacks.push(self.track(topic, &format!("cb{i}")).await);
        }
        let connection = self.transport.last();
        connection.open().await;
        connection.authorize().await;
        (connection, callbacks)
    }
}

pub fn topic(service: &str, key: &str) -> Topic {
    Topic::new(service, key)
}

/// Lets spawned tasks run until they block.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
