//! JSON encoding of outbound frames and decoding of inbound ones.

use serde_json::Value;

use tracklink_core::{AppError, AppResult, ErrorKind, Topic};

use super::types::{InboundFrame, OutboundFrame, TopicFrameKind};

/// Serialize a single outbound frame.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Serialize the batch sent right after the socket opens: the connect frame
/// followed by one `track` frame per topic, in the given order.
pub fn encode_batch(connect_key: &str, topics: &[Topic]) -> Result<String, serde_json::Error> {
    let mut frames = Vec::with_capacity(topics.len() + 1);
    frames.push(OutboundFrame::Connect {
        key: connect_key.to_string(),
    });
    frames.extend(
        topics
            .iter()
            .map(|topic| OutboundFrame::for_topic(TopicFrameKind::Track, topic)),
    );
    serde_json::to_string(&frames)
}

/// Decode an inbound text frame.
///
/// Text that is not JSON at all is taken as a bare control string; JSON of
/// an unrecognized shape is a protocol error.
pub fn decode_inbound(raw: &str) -> AppResult<InboundFrame> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Ok(InboundFrame::Control(raw.trim().to_string()));
    };
    serde_json::from_value(value).map_err(|e| {
        AppError::with_source(ErrorKind::Protocol, "Unrecognized inbound frame", e)
    })
}
