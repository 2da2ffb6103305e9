//! Inbound and outbound frame definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracklink_core::Topic;

/// Control string the backend sends once the connect key is accepted.
pub const AUTHORIZED: &str = "authorized";

/// Control string the backend sends in reply to a ping.
pub const PONG: &str = "pong";

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Binds the connection to a session using the handshake key.
    Connect {
        /// One-time connect key.
        key: String,
    },
    /// Start receiving events for a topic.
    Track {
        /// Service name.
        service: String,
        /// Key within the service.
        key: String,
    },
    /// Stop receiving events for a topic.
    Untrack {
        /// Service name.
        service: String,
        /// Key within the service.
        key: String,
    },
    /// Keepalive.
    Ping,
}

/// Which per-topic frame to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicFrameKind {
    /// `{"_type":"track", ...}`
    Track,
    /// `{"_type":"untrack", ...}`
    Untrack,
}

impl OutboundFrame {
    /// Builds the per-topic frame of the given kind.
    pub fn for_topic(kind: TopicFrameKind, topic: &Topic) -> Self {
        let service = topic.service.clone();
        let key = topic.key.clone();
        match kind {
            TopicFrameKind::Track => Self::Track { service, key },
            TopicFrameKind::Untrack => Self::Untrack { service, key },
        }
    }
}

/// Error reported by the backend.
///
/// Decoded leniently: the code may be missing or sent as a string, and the
/// `error` field may be a bare string instead of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct BackendError {
    /// Numeric error code, when the backend sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Description.
    pub msg: String,
}

impl From<Value> for BackendError {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => {
                let code = fields.get("code").and_then(|code| match code {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                });
                let msg = match fields.get("msg").or_else(|| fields.get("message")) {
                    Some(Value::String(msg)) => msg.clone(),
                    Some(other) => other.to_string(),
                    None => Value::Object(fields).to_string(),
                };
                Self { code, msg }
            }
            Value::String(msg) => Self { code: None, msg },
            other => Self {
                code: None,
                msg: other.to_string(),
            },
        }
    }
}

/// Frames received from the backend.
///
/// Variant order matters for untagged decoding: an object carrying `error`
/// is an error even if it also has topic fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    /// Bare control string (`"authorized"`, `"pong"`).
    Control(String),
    /// Backend-reported error.
    Error {
        /// Error details.
        error: BackendError,
    },
    /// Event for a topic.
    Data {
        /// Service name.
        service: String,
        /// Key within the service.
        key: String,
        /// Event payload.
        #[serde(default)]
        data: Value,
    },
}
