//! Row-by-row list updates shared by the stores.

use crudbase_core::result::AppResult;
use crudbase_core::traits::{Dao, UnitOfWork};
use crudbase_entity::Entity;

use crate::exclusive;

/// Update every entity by primary key inside one unit of work.
///
/// Exclusive updates stop at the first entity that matched nothing and roll
/// the whole list back.
pub async fn update_each<E, S>(
    store: &S,
    entities: &[E],
    selective: bool,
    exclusive: bool,
) -> AppResult<u64>
where
    E: Entity,
    S: Dao<E> + UnitOfWork,
{
    if entities.is_empty() {
        return Ok(0);
    }
    let scope = store.begin().await?;
    let result = update_rows(&scope, entities, selective, exclusive).await;
    scope.settle(result).await
}

async fn update_rows<E, S>(
    store: &S,
    entities: &[E],
    selective: bool,
    exclusive: bool,
) -> AppResult<u64>
where
    E: Entity,
    S: Dao<E>,
{
    let mut total = 0;
    for entity in entities {
        let example = entity.primary_key_example()?;
        total += match (exclusive, selective) {
            (true, _) => exclusive::update(store, entity, example, selective).await?,
            (false, true) => store.update_by_example_selective(entity, &example).await?,
            (false, false) => store.update_by_example(entity, &example).await?,
        };
    }
    Ok(total)
}
