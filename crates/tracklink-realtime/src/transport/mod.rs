//! Socket transport adapters.

pub mod websocket;

pub use websocket::WsTransport;
