//! Subscription registry: topic → ordered callback list.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use tracklink_core::Topic;

use super::callback::TopicCallback;

/// What a successful removal left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// The topic has no callbacks left and was pruned.
    pub topic_empty: bool,
    /// No topic of the same service remains.
    pub service_empty: bool,
    /// The registry holds no topics at all.
    pub registry_empty: bool,
}

/// In-memory registry of topic callbacks.
///
/// Invariant: every stored topic has at least one callback. Entries are
/// pruned as soon as their last callback is removed. Iteration follows
/// [`Topic`] ordering (service, then key).
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    /// Topic → callbacks in insertion order.
    topics: Mutex<BTreeMap<Topic, Vec<TopicCallback>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback to a topic, creating the entry if needed.
    ///
    /// Duplicates are kept: a callback added twice runs twice per event.
    pub fn add_callback(&self, topic: Topic, callback: TopicCallback) {
        let mut topics = self.topics.lock();
        let callbacks = topics.entry(topic).or_default();
        callbacks.push(callback);
        debug!(count = callbacks.len(), "Callback added");
    }

    /// Removes the first callback equal to `callback` from a topic.
    ///
    /// Returns `None` when nothing matched, leaving the registry untouched.
    pub fn remove_callback(&self, topic: &Topic, callback: &TopicCallback) -> Option<Removal> {
        let mut topics = self.topics.lock();
        let callbacks = topics.get_mut(topic)?;
        let position = callbacks.iter().position(|cb| cb == callback)?;
        callbacks.remove(position);

        let topic_empty = callbacks.is_empty();
        if topic_empty {
            topics.remove(topic);
        }

        let service_empty = !topics.keys().any(|t| t.service == topic.service);

        Some(Removal {
            topic_empty,
            service_empty,
            registry_empty: topics.is_empty(),
        })
    }

    /// Returns every registered topic in iteration order.
    pub fn snapshot_topics(&self) -> Vec<Topic> {
        self.topics.lock().keys().cloned().collect()
    }

    /// Invokes each callback of `topic` in registration order.
    ///
    /// Callbacks run after the registry lock is released, so they may
    /// track or untrack re-entrantly. Returns how many callbacks ran;
    /// unknown topics are a silent no-op.
    pub fn dispatch(&self, topic: &Topic, payload: &Value) -> usize {
        let callbacks = self.topics.lock().get(topic).cloned();
        let Some(callbacks) = callbacks else {
            return 0;
        };
        for callback in &callbacks {
            callback.call(payload);
        }
        callbacks.len()
    }

    /// Drops every topic. Returns how many topics were removed.
    pub fn clear(&self) -> usize {
        let mut topics = self.topics.lock();
        let count = topics.len();
        topics.clear();
        count
    }

    /// Whether no topic is registered.
    pub fn is_empty(&self) -> bool {
        self.topics.lock().is_empty()
    }

    /// Number of registered topics.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().len()
    }

    /// Number of callbacks registered for a topic.
    pub fn callback_count(&self, topic: &Topic) -> usize {
        self.topics.lock().get(topic).map(Vec::len).unwrap_or(0)
    }

    /// Whether a topic is registered.
    pub fn contains(&self, topic: &Topic) -> bool {
        self.topics.lock().contains_key(topic)
    }
}
