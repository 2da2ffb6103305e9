//! WebSocket transport backed by `tokio-tungstenite`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, warn};

use tracklink_core::error::ErrorKind;
use tracklink_core::traits::{SocketTransport, TransportConnection, TransportEvent, TransportSink};
use tracklink_core::{AppError, AppResult};

/// Commands from the sink to the socket task.
#[derive(Debug)]
enum Outgoing {
    Frame(String),
    Close(u16, String),
}

/// Opens WebSocket connections, one socket task per connection.
#[derive(Debug, Clone)]
pub struct WsTransport {
    /// Capacity of the inbound event channel.
    event_buffer: usize,
}

impl WsTransport {
    /// Creates a transport whose event channels hold `event_buffer` events.
    pub fn new(event_buffer: usize) -> Self {
        Self {
            event_buffer: event_buffer.max(1),
        }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl SocketTransport for WsTransport {
    async fn open(&self, url: &str, headers: &[(String, String)]) -> AppResult<TransportConnection> {
        let mut request = url.into_client_request().map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Invalid realtime URL '{url}'"),
                e,
            )
        })?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::validation(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::validation(format!("Invalid header value: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        let (event_tx, event_rx) = mpsc::channel(self.event_buffer);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        tokio::spawn(run_socket(request, event_tx, outgoing_rx, Arc::clone(&open)));

        Ok(TransportConnection {
            sink: Box::new(WsSink {
                outgoing: outgoing_tx,
                open,
            }),
            events: event_rx,
        })
    }
}

/// Outbound half handed to the controller.
#[derive(Debug)]
struct WsSink {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    open: Arc<AtomicBool>,
}

impl TransportSink for WsSink {
    fn send(&self, text: String) -> AppResult<()> {
        if !self.is_open() {
            return Err(AppError::transport("Socket is not open"));
        }
        self.outgoing
            .send(Outgoing::Frame(text))
            .map_err(|_| AppError::transport("Socket task has stopped"))
    }

    fn close(&self, code: u16, reason: &str) {
        self.open.store(false, Ordering::SeqCst);
        if self
            .outgoing
            .send(Outgoing::Close(code, reason.to_string()))
            .is_err()
        {
            debug!("Close requested on a finished socket");
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Socket task: connects, then pumps frames both ways until the socket
/// closes. Always ends with exactly one `Close` event.
async fn run_socket(
    request: Request,
    events: mpsc::Sender<TransportEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    open: Arc<AtomicBool>,
) {
    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(error = %e, "WebSocket connect failed");
            let _ = events.send(TransportEvent::Error(e.to_string())).await;
            let _ = events
                .send(TransportEvent::Close {
                    code: None,
                    reason: "connect failed".to_string(),
                })
                .await;
            return;
        }
    };

    open.store(true, Ordering::SeqCst);
    let _ = events.send(TransportEvent::Open).await;

    let (mut write, mut read) = stream.split();
    let mut closing = false;

    let (code, reason) = loop {
        tokio::select! {
            command = outgoing.recv(), if !closing => match command {
                Some(Outgoing::Frame(text)) => {
                    if let Err(e) = write.send(Message::text(text)).await {
                        let _ = events.send(TransportEvent::Error(e.to_string())).await;
                        break (None, "send failed".to_string());
                    }
                }
                Some(Outgoing::Close(code, reason)) => {
                    closing = true;
                    open.store(false, Ordering::SeqCst);
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    if write.send(Message::Close(Some(frame))).await.is_err() {
                        break (Some(code), reason);
                    }
                }
                None => {
                    closing = true;
                    open.store(false, Ordering::SeqCst);
                    let _ = write.send(Message::Close(None)).await;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let _ = events
                        .send(TransportEvent::Message(text.as_str().to_owned()))
                        .await;
                }
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.as_str().to_owned()),
                        None => (None, String::new()),
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    break (None, e.to_string());
                }
                None => break (None, "stream ended".to_string()),
            },
        }
    };

    open.store(false, Ordering::SeqCst);
    debug!(code = ?code, reason = %reason, "WebSocket closed");
    let _ = events.send(TransportEvent::Close { code, reason }).await;
}
