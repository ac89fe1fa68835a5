//! Convenience result type alias for crudbase.

use crate::error::AppError;

/// A specialized `Result` type for crudbase operations.
pub type AppResult<T> = Result<T, AppError>;
