//! Callback handles registered against a topic.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A shared callback invoked with each payload pushed on a topic.
///
/// Equality is identity: two handles are equal only when they are clones
/// of the same allocation, so `untrack` removes exactly the handle that
/// was passed to `track`.
#[derive(Clone)]
pub struct TopicCallback(Arc<dyn Fn(&Value) + Send + Sync>);

impl TopicCallback {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, payload: &Value) {
        (self.0)(payload)
    }
}

impl PartialEq for TopicCallback {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Eq for TopicCallback {}

impl fmt::Debug for TopicCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TopicCallback")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
