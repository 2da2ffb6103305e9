//! # tracklink-core
//!
//! Core crate for tracklink. Contains the collaborator traits (transport,
//! handshake, event sink), configuration schemas, the [`Topic`] identifier,
//! the cookie header builder, and the unified error system.
//!
//! This crate has **no** internal dependencies on other tracklink crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use types::topic::Topic;
