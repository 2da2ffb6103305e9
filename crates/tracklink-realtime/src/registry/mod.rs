//! Topic subscription registry.

pub mod callback;
pub mod subscription;

pub use callback::TopicCallback;
pub use subscription::{Removal, SubscriptionRegistry};
