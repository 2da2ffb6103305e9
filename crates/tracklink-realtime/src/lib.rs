//! # tracklink-realtime
//!
//! Realtime topic client for tracklink. Provides:
//!
//! - A subscription registry mapping topics to ordered callback lists
//! - Outbound/inbound frame types and the inbound message router
//! - The connection controller: handshake, batched subscribe on open,
//!   authorization, keepalive, and reconnect after unexpected closes
//! - The [`RealtimeClient`] facade (`cookies`, `init`, `track`, `untrack`)
//! - Event sinks, link metrics, and WebSocket/HTTP collaborator adapters

pub mod client;
pub mod connection;
pub mod handshake;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod sink;
pub mod transport;

pub use client::RealtimeClient;
pub use connection::controller::ConnectionController;
pub use connection::state::ConnectionState;
pub use handshake::http::HttpHandshakeClient;
pub use registry::{SubscriptionRegistry, TopicCallback};
pub use transport::websocket::WsTransport;
