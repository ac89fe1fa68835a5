//! Flag codes stored in rows or sent by callers.
//!
//! Codes travel as the strings `"0"` / `"1"`, both in the `del_flag` column
//! and in the JSON of a [`PageQuery`](super::pagination::PageQuery).

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::value::Value;

/// Soft-delete state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeleteFlag {
    /// The row is live.
    #[serde(rename = "0")]
    Exist,
    /// The row is logically deleted.
    #[serde(rename = "1")]
    Deleted,
}

impl DeleteFlag {
    /// The code stored in the `del_flag` column.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exist => "0",
            Self::Deleted => "1",
        }
    }

    /// Parse a stored code.
    pub fn from_code(code: &str) -> Result<Self, AppError> {
        match code {
            "0" => Ok(Self::Exist),
            "1" => Ok(Self::Deleted),
            other => Err(AppError::validation(format!("Unknown delete flag '{other}'"))),
        }
    }
}

impl From<DeleteFlag> for Value {
    fn from(flag: DeleteFlag) -> Self {
        Value::Text(flag.code().to_string())
    }
}

/// Whether a caller wants a paged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFlag {
    /// Return the whole result set.
    #[serde(rename = "0")]
    NoPage,
    /// Return one page.
    #[serde(rename = "1")]
    Page,
}

/// Whether a caller wants the unpaged rows for a total line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalFlag {
    #[serde(rename = "0")]
    NoTotal,
    #[serde(rename = "1")]
    Total,
}
