//! Shared domain types.

pub mod cookie;
pub mod topic;

pub use cookie::build_cookie_header;
pub use topic::Topic;
