//! Topic identifier: a `(service, key)` pair naming one stream of pushed events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One stream of server-pushed events.
///
/// Ordered by service, then key. Displayed and parsed as `service/key`;
/// the key may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Topic {
    /// Backend service name.
    pub service: String,
    /// Key within the service.
    pub key: String,
}

impl Topic {
    /// Creates a topic.
    pub fn new(service: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.key)
    }
}

impl FromStr for Topic {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((service, key)) if !service.is_empty() && !key.is_empty() => {
                Ok(Self::new(service, key))
            }
            _ => Err(AppError::validation(format!(
                "Invalid topic '{s}', expected 'service/key'"
            ))),
        }
    }
}
