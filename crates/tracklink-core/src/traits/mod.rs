//! Collaborator traits consumed by the realtime core.
//!
//! The core never talks to the network directly; it drives these traits.
//! Real implementations live in `tracklink-realtime`, test doubles in the
//! integration tests.

pub mod handshake;
pub mod sink;
pub mod transport;

pub use handshake::HandshakeClient;
pub use sink::{EventSink, LinkEvent};
pub use transport::{SocketTransport, TransportConnection, TransportEvent, TransportSink};
