//! Session cookies and startup subscriptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::topic::Topic;

/// Session settings forwarded to the backend on connect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name → value, sent as the `Cookie` header.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

/// A topic to track at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Service name.
    pub service: String,
    /// Key within the service.
    pub key: String,
}

impl SubscriptionConfig {
    /// Converts into a [`Topic`].
    pub fn topic(&self) -> Topic {
        Topic::new(self.service.clone(), self.key.clone())
    }
}
