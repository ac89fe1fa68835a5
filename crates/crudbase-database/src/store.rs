//! PostgreSQL store for one entity type.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao, UnitOfWork};
use crudbase_core::types::{Example, PageWindow, Record, Value};
use crudbase_entity::Entity;

use crate::bulk;
use crate::connection::DbHandle;
use crate::row;
use crate::sql;

/// [`Dao`], [`BulkDao`] and [`UnitOfWork`] for entity `E` on PostgreSQL.
pub struct PgStore<E> {
    db: DbHandle,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgStore<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for PgStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").field("db", &self.db).finish()
    }
}

impl<E: Entity> PgStore<E> {
    /// Create a store running on the pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_handle(DbHandle::Pool(pool))
    }

    /// Create a store running on an existing handle.
    pub fn with_handle(db: DbHandle) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn handle(&self) -> &DbHandle {
        &self.db
    }

    async fn write(&self, query: sql::PgQuery, action: &'static str) -> AppResult<u64> {
        let rows = self.db.execute(query).await?;
        debug!(table = E::meta().table, rows, action, "Statement done");
        Ok(rows)
    }

    async fn insert_chunks(&self, records: &[Record]) -> AppResult<u64> {
        let meta = E::meta();
        let mut total = 0;
        for chunk in records.chunks(sql::rows_per_insert(meta)) {
            total += self
                .write(sql::insert_many(meta, chunk)?, "insert_list")
                .await?;
        }
        Ok(total)
    }
}

#[async_trait]
impl<E: Entity> Dao<E> for PgStore<E> {
    async fn insert(&self, entity: &E) -> AppResult<u64> {
        let query = sql::insert(E::meta(), &entity.to_record(), false)?;
        self.write(query, "insert").await
    }

    async fn insert_selective(&self, entity: &E) -> AppResult<u64> {
        let query = sql::insert(E::meta(), &entity.to_record(), true)?;
        self.write(query, "insert_selective").await
    }

    async fn update_by_primary_key(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_by_example(entity, &example).await
    }

    async fn update_by_primary_key_selective(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_by_example_selective(entity, &example).await
    }

    async fn update_by_example(&self, entity: &E, example: &Example) -> AppResult<u64> {
        let query = sql::update(E::meta(), &entity.to_record(), example, false)?;
        self.write(query, "update").await
    }

    async fn update_by_example_selective(&self, entity: &E, example: &Example) -> AppResult<u64> {
        let query = sql::update(E::meta(), &entity.to_record(), example, true)?;
        self.write(query, "update_selective").await
    }

    async fn delete(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.delete_by_example(&example).await
    }

    async fn delete_by_example(&self, example: &Example) -> AppResult<u64> {
        let query = sql::delete(E::meta(), example)?;
        self.write(query, "delete").await
    }

    async fn select_by_primary_key(&self, id: &Value) -> AppResult<Option<E>> {
        let example = E::meta().key_example(id)?;
        let mut rows = self
            .select_by_example(&example, Some(PageWindow::new(1, 1)))
            .await?;
        Ok(rows.pop())
    }

    async fn select_by_example(
        &self,
        example: &Example,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<E>> {
        let meta = E::meta();
        let rows = self.db.fetch_all(sql::select(meta, example, window)?).await?;
        debug!(table = meta.table, rows = rows.len(), "Rows fetched");
        rows.iter()
            .map(|r| row::decode(meta, r).and_then(E::from_record))
            .collect()
    }

    async fn count_by_example(&self, example: &Example) -> AppResult<u64> {
        self.db.fetch_count(sql::count(E::meta(), example)?).await
    }
}

#[async_trait]
impl<E: Entity> BulkDao<E> for PgStore<E> {
    async fn insert_list(&self, entities: &[E]) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        let records: Vec<Record> = entities.iter().map(E::to_record).collect();
        let scope = self.begin().await?;
        let result = scope.insert_chunks(&records).await;
        scope.settle(result).await
    }

    async fn update_list(
        &self,
        entities: &[E],
        selective: bool,
        exclusive: bool,
    ) -> AppResult<u64> {
        bulk::update_each(self, entities, selective, exclusive).await
    }
}

#[async_trait]
impl<E: Entity> UnitOfWork for PgStore<E> {
    async fn begin(&self) -> AppResult<Self> {
        Ok(Self::with_handle(self.db.begin().await?))
    }

    async fn commit(self) -> AppResult<()> {
        self.db.commit().await
    }

    async fn rollback(self) -> AppResult<()> {
        self.db.rollback().await
    }
}
