//! Convenience result type alias for persistence-geo.

use crate::error::AppError;

/// A specialized `Result` type for persistence-geo operations.
pub type AppResult<T> = Result<T, AppError>;
