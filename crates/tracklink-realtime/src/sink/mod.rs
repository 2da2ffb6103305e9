//! Event sink implementations.

pub mod broadcast;
pub mod logging;

pub use self::broadcast::BroadcastSink;
pub use self::logging::TracingSink;
