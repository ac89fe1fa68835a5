//! Core type definitions used across the crudbase workspace.

pub mod criteria;
pub mod flags;
pub mod pagination;
pub mod record;
pub mod value;

pub use criteria::{
    Condition, Criteria, Criterion, DEL_FLAG_COLUMN, Example, OrderBy, SortDirection,
    UPDATE_TIME_COLUMN,
};
pub use flags::{DeleteFlag, PageFlag, TotalFlag};
pub use pagination::{PageInfo, PagePlan, PageQuery, PageResult, PageWindow};
pub use record::Record;
pub use value::Value;
