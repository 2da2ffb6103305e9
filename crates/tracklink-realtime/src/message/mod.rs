//! Wire frames, their JSON codec, and the inbound router.

pub mod router;
pub mod serializer;
pub mod types;

pub use router::{ControlSignal, MessageRouter};
pub use types::{BackendError, InboundFrame, OutboundFrame, TopicFrameKind};
