//! Human-readable messages carried by [`AppError`](crate::AppError).
//!
//! Callers match on [`ErrorKind`](crate::error::ErrorKind); the text is what
//! ends up in API failure responses.

/// The criteria object has no condition group.
pub const CRITERIA_NOT_EXIST: &str = "Query criteria contain no condition group";

/// A condition group has no condition.
pub const CRITERION_NOT_EXIST: &str = "Query condition group contains no condition";

/// A condition operand is null, blank, or an empty collection.
pub const CRITERION_VALUE_NOT_EXIST: &str = "Query condition value is missing";

/// The entity declares no primary key column.
pub const PRIMARY_KEY_NOT_DECLARED: &str = "Entity declares no primary key column";

/// The operation needs exactly one primary key column.
pub const PRIMARY_KEY_NOT_SINGLE: &str = "Entity must declare exactly one primary key column";

/// A primary key value needed to address a row is missing.
pub const PRIMARY_KEY_VALUE_MISSING: &str = "Primary key value is missing";

/// An exclusive update was requested without the last observed update time.
pub const UPDATE_LAST_TIME_MISSING: &str =
    "Last update time is required for an exclusive update";

/// An exclusive update matched a live row that has since been modified.
pub const EXCLUSIVE_CONFLICT: &str =
    "The record was modified by another user, reload it and try again";

/// An exclusive update found no live row to update.
pub const EXCLUSIVE_TARGET_MISSING: &str = "The record to update no longer exists";

/// A selective update carried no non-null column.
pub const NOTHING_TO_UPDATE: &str = "No column to update";

/// A multi-table query could not be resolved or executed.
pub const QUERY_FAILED: &str = "Query failed";
