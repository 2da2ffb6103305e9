//! Connect-key handshake adapters.

pub mod http;

pub use http::HttpHandshakeClient;
