//! Connection lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the single realtime connection currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none in flight.
    #[default]
    Closed,
    /// Handshake or socket open in flight.
    Connecting,
    /// Socket open and batch sent; waiting for `authorized`.
    OpenUnauthorized,
    /// Ready for topic traffic.
    OpenAuthorized,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Connecting => write!(f, "connecting"),
            Self::OpenUnauthorized => write!(f, "open_unauthorized"),
            Self::OpenAuthorized => write!(f, "open_authorized"),
        }
    }
}
