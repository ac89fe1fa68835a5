//! Per-row and criteria-based data access for one entity type.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::criteria::Example;
use crate::types::pagination::PageWindow;
use crate::types::value::Value;

/// Data access object for entity type `E`.
///
/// Implementations execute exactly what they are given: soft-delete
/// filtering, criteria validation and concurrency checks are layered on
/// top by the repository. "Selective" variants only write the columns
/// whose value is not null. Updates never write primary key columns.
#[async_trait]
pub trait Dao<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Insert a row with every column.
    async fn insert(&self, entity: &E) -> AppResult<u64>;

    /// Insert a row with the non-null columns only.
    async fn insert_selective(&self, entity: &E) -> AppResult<u64>;

    /// Update every non-key column of the row addressed by the entity's key.
    async fn update_by_primary_key(&self, entity: &E) -> AppResult<u64>;

    /// Update the non-null, non-key columns of the row addressed by the key.
    async fn update_by_primary_key_selective(&self, entity: &E) -> AppResult<u64>;

    /// Update every non-key column of the rows matching the example.
    async fn update_by_example(&self, entity: &E, example: &Example) -> AppResult<u64>;

    /// Update the non-null, non-key columns of the rows matching the example.
    async fn update_by_example_selective(&self, entity: &E, example: &Example) -> AppResult<u64>;

    /// Physically delete the row addressed by the entity's key.
    async fn delete(&self, entity: &E) -> AppResult<u64>;

    /// Physically delete the rows matching the example.
    async fn delete_by_example(&self, example: &Example) -> AppResult<u64>;

    /// Fetch a row by key regardless of its soft-delete flag.
    ///
    /// Composite keys are passed as a [`Value::List`] in declaration order.
    async fn select_by_primary_key(&self, id: &Value) -> AppResult<Option<E>>;

    /// Fetch the rows matching the example, optionally one window of them.
    async fn select_by_example(
        &self,
        example: &Example,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<E>>;

    /// Count the rows matching the example.
    async fn count_by_example(&self, example: &Example) -> AppResult<u64>;
}
