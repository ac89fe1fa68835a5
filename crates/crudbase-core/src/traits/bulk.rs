//! Batch writes for one entity type.

use async_trait::async_trait;

use crate::result::AppResult;

/// Batch insert/update helper used by list operations and reconciliation.
#[async_trait]
pub trait BulkDao<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Insert every entity. Returns the number of inserted rows.
    async fn insert_list(&self, entities: &[E]) -> AppResult<u64>;

    /// Update every entity by primary key.
    ///
    /// `selective` writes only non-null columns. `exclusive` guards each row
    /// with its live flag and last observed update time and fails on the
    /// first row that matched nothing.
    async fn update_list(&self, entities: &[E], selective: bool, exclusive: bool)
    -> AppResult<u64>;
}
