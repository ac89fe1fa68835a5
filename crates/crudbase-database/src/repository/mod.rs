//! Generic repository with soft delete, exclusive updates and paging.
//!
//! [`BaseRepository`] wraps any store implementing [`Dao`] and [`BulkDao`]
//! for an entity type. Every criteria-based read, update and logical delete
//! targets live rows only: `del_flag = '0'` is ANDed into every criteria
//! group before the store sees the example. Examples handed to mutating
//! operations are validated first, so a missing operand fails instead of
//! widening the statement.

mod named;
mod page;
mod reconcile;

use std::marker::PhantomData;

use crudbase_core::config::PageConfig;
use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao, UnitOfWork};
use crudbase_core::types::{DeleteFlag, Example, PageWindow, Value};
use crudbase_entity::Entity;

use crate::exclusive;

pub use named::NamedQueries;
pub use reconcile::ReconcileOutcome;

/// Data access for entity `E` through store `S`.
pub struct BaseRepository<E, S> {
    store: S,
    page: PageConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S: Clone> Clone for BaseRepository<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            page: self.page.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E, S: std::fmt::Debug> std::fmt::Debug for BaseRepository<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseRepository")
            .field("store", &self.store)
            .field("page", &self.page)
            .finish()
    }
}

impl<E, S> BaseRepository<E, S>
where
    E: Entity,
    S: Dao<E> + BulkDao<E>,
{
    /// Create a repository over a store.
    pub fn new(store: S, page: PageConfig) -> Self {
        Self {
            store,
            page,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert a row with every column.
    pub async fn insert(&self, entity: &E) -> AppResult<u64> {
        self.store.insert(entity).await
    }

    /// Insert a row with the non-null columns only.
    pub async fn insert_selective(&self, entity: &E) -> AppResult<u64> {
        self.store.insert_selective(entity).await
    }

    /// Insert every entity through the bulk helper.
    pub async fn insert_list(&self, entities: &[E]) -> AppResult<u64> {
        self.store.insert_list(entities).await
    }

    pub async fn update_by_primary_key(&self, entity: &E) -> AppResult<u64> {
        self.store.update_by_primary_key(entity).await
    }

    pub async fn update_by_primary_key_selective(&self, entity: &E) -> AppResult<u64> {
        self.store.update_by_primary_key_selective(entity).await
    }

    /// Exclusive full update of the row addressed by the entity's key.
    pub async fn update_by_primary_key_exclusive(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_by_example_exclusive(entity, example).await
    }

    /// Exclusive selective update of the row addressed by the entity's key.
    pub async fn update_by_primary_key_selective_exclusive(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_by_example_selective_exclusive(entity, example)
            .await
    }

    /// Full update of every entity by key.
    pub async fn update_by_primary_key_list(&self, entities: &[E], exclusive: bool) -> AppResult<u64> {
        self.store.update_list(entities, false, exclusive).await
    }

    /// Selective update of every entity by key.
    pub async fn update_by_primary_key_selective_list(
        &self,
        entities: &[E],
        exclusive: bool,
    ) -> AppResult<u64> {
        self.store.update_list(entities, true, exclusive).await
    }

    /// Full update of the live rows matching the example.
    pub async fn update_by_example(&self, entity: &E, example: Example) -> AppResult<u64> {
        let example = Self::live_for_mutation(example)?;
        self.store.update_by_example(entity, &example).await
    }

    /// Selective update of the live rows matching the example.
    pub async fn update_by_example_selective(&self, entity: &E, example: Example) -> AppResult<u64> {
        let example = Self::live_for_mutation(example)?;
        self.store.update_by_example_selective(entity, &example).await
    }

    /// Full update guarded by the entity's `update_last_time`.
    ///
    /// Fails with a conflict when a live row matched but its `update_time`
    /// moved on, and with not-found when no live row matches at all.
    ///
    /// The entity's own `update_time` is ignored: the repository always
    /// writes a fresh stamp later than `update_last_time`, so two writers
    /// holding the same observation cannot both succeed.
    pub async fn update_by_example_exclusive(&self, entity: &E, example: Example) -> AppResult<u64> {
        let example = Self::checked(example)?;
        exclusive::update(&self.store, entity, example, false).await
    }

    /// Selective update guarded by the entity's `update_last_time`.
    ///
    /// Stamps `update_time` like
    /// [`update_by_example_exclusive`](Self::update_by_example_exclusive).
    pub async fn update_by_example_selective_exclusive(
        &self,
        entity: &E,
        example: Example,
    ) -> AppResult<u64> {
        let example = Self::checked(example)?;
        exclusive::update(&self.store, entity, example, true).await
    }

    /// Physically delete the row addressed by the entity's key.
    pub async fn delete_physical(&self, entity: &E) -> AppResult<u64> {
        self.store.delete(entity).await
    }

    /// Physically delete rows by key, soft-deleted ones included.
    pub async fn delete_physical_by_ids(&self, ids: &[Value]) -> AppResult<u64> {
        let key = E::meta().single_primary_key()?;
        if ids.is_empty() {
            return Ok(0);
        }
        let mut example = Example::new();
        example.create_criteria().and_in(key.name, ids.to_vec());
        let example = Self::checked(example)?;
        self.store.delete_by_example(&example).await
    }

    /// Flag the entity's row as deleted.
    pub async fn delete_logical(&self, entity: &E) -> AppResult<u64> {
        self.store
            .update_by_primary_key_selective(&deleted(entity))
            .await
    }

    /// Flag the live rows matching the example as deleted.
    ///
    /// The non-null columns of `template` (typically the audit columns) are
    /// written along with the flag.
    pub async fn delete_logical_by_example(&self, template: &E, example: Example) -> AppResult<u64> {
        self.update_by_example_selective(&deleted(template), example)
            .await
    }

    /// Flag the live rows with the given keys as deleted.
    pub async fn delete_logical_by_ids(&self, template: &E, ids: &[Value]) -> AppResult<u64> {
        let key = E::meta().single_primary_key()?;
        self.delete_logical_by_ids_on(template, key.name, ids).await
    }

    /// Flag the live rows whose `column` is one of `ids` as deleted.
    pub async fn delete_logical_by_ids_on(
        &self,
        template: &E,
        column: &str,
        ids: &[Value],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut example = Example::new();
        example.create_criteria().and_in(column, ids.to_vec());
        self.delete_logical_by_example(template, example).await
    }

    /// Every live row.
    pub async fn select_all(&self) -> AppResult<Vec<E>> {
        self.select_list_by_example(Example::new()).await
    }

    /// The first live row matching the example.
    pub async fn select_one_by_example(&self, example: Example) -> AppResult<Option<E>> {
        let example = Self::live(example)?;
        let mut rows = self
            .store
            .select_by_example(&example, Some(PageWindow::new(1, 1)))
            .await?;
        Ok(rows.pop())
    }

    /// The live row with the given key; soft-deleted rows read as `None`.
    pub async fn select_by_primary_key(&self, id: &Value) -> AppResult<Option<E>> {
        let row = self.store.select_by_primary_key(id).await?;
        Ok(row.filter(|entity| !entity.is_deleted()))
    }

    /// Every live row matching the example.
    pub async fn select_list_by_example(&self, example: Example) -> AppResult<Vec<E>> {
        let example = Self::live(example)?;
        self.store.select_by_example(&example, None).await
    }

    /// Validate columns and restrict every group to live rows.
    fn live(mut example: Example) -> AppResult<Example> {
        E::meta().check_example(&example)?;
        example.ensure_criteria().and_live();
        Ok(example)
    }

    /// Validate an example for a mutating statement.
    fn checked(example: Example) -> AppResult<Example> {
        example.validate_for_mutation()?;
        E::meta().check_example(&example)?;
        Ok(example)
    }

    fn live_for_mutation(example: Example) -> AppResult<Example> {
        let mut example = Self::checked(example)?;
        example.and_live();
        Ok(example)
    }
}

impl<E, S> BaseRepository<E, S>
where
    E: Entity,
    S: Dao<E> + BulkDao<E> + UnitOfWork,
{
    /// A repository bound to a new transaction, or joined to the current one.
    pub async fn begin(&self) -> AppResult<Self> {
        Ok(Self {
            store: self.store.begin().await?,
            page: self.page.clone(),
            _entity: PhantomData,
        })
    }

    pub async fn commit(self) -> AppResult<()> {
        self.store.commit().await
    }

    pub async fn rollback(self) -> AppResult<()> {
        self.store.rollback().await
    }
}

/// A copy of `entity` carrying the deleted flag.
fn deleted<E: Entity>(entity: &E) -> E {
    let mut flagged = entity.clone();
    flagged.base_mut().del_flag = Some(DeleteFlag::Deleted);
    flagged
}
