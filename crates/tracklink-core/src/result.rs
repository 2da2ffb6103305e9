//! Convenience result type alias for tracklink.

use crate::error::AppError;

/// A specialized `Result` type for tracklink operations.
pub type AppResult<T> = Result<T, AppError>;
