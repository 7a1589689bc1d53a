//! Convenience result type alias for Trellis.

use crate::error::AppError;

/// A specialized `Result` type for Trellis operations.
pub type AppResult<T> = Result<T, AppError>;
