//! Socket transport collaborator.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::result::AppResult;

/// Notification produced by an open transport connection, delivered in
/// arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket finished its opening handshake.
    Open,
    /// A text frame arrived.
    Message(String),
    /// A transport-level error. A `Close` always follows eventually.
    Error(String),
    /// The socket closed. Sent at most once and always last.
    Close {
        /// Close code, if the peer sent one.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },
}

/// Outbound half of a transport connection.
pub trait TransportSink: Send + Sync + std::fmt::Debug {
    /// Queue a text frame. The transport owns any buffering.
    fn send(&self, text: String) -> AppResult<()>;

    /// Request a close handshake with the given code and reason.
    fn close(&self, code: u16, reason: &str);

    /// Whether the socket is currently open.
    fn is_open(&self) -> bool;
}

/// A connection handed out by [`SocketTransport::open`].
#[derive(Debug)]
pub struct TransportConnection {
    /// Outbound frames and close requests.
    pub sink: Box<dyn TransportSink>,
    /// Inbound notifications.
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Opens socket connections.
#[async_trait]
pub trait SocketTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Start connecting to `url` with the given request headers.
    ///
    /// Returns as soon as the connection object exists; the `Open` event
    /// signals that frames may flow.
    async fn open(&self, url: &str, headers: &[(String, String)]) -> AppResult<TransportConnection>;
}
