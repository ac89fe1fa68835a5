//! The trait every persisted business type implements.

use crudbase_core::result::AppResult;
use crudbase_core::types::{Example, Record, Value};

use crate::base::BaseFields;
use crate::meta::EntityMeta;

/// A business record stored in one table.
///
/// Implementors describe their table with a static [`EntityMeta`] and
/// convert to and from a [`Record`] keyed by column name. Optional fields
/// map to `NULL`, which selective writes skip.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Table metadata.
    fn meta() -> &'static EntityMeta;

    /// Every column of this entity, audit columns included.
    fn to_record(&self) -> Record;

    /// Build an entity from a fetched row.
    fn from_record(record: Record) -> AppResult<Self>;

    fn base(&self) -> &BaseFields;

    fn base_mut(&mut self) -> &mut BaseFields;

    /// Name reported as the row type of a page.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The primary key value; a [`Value::List`] for composite keys.
    fn primary_key_value(&self) -> Value {
        let keys = Self::meta().primary_keys();
        let record = self.to_record();
        match keys.as_slice() {
            [] => Value::Null,
            [key] => record.get(key.name).clone(),
            keys => Value::List(keys.iter().map(|k| record.get(k.name).clone()).collect()),
        }
    }

    /// An example addressing this entity's row by primary key.
    fn primary_key_example(&self) -> AppResult<Example> {
        Self::meta().key_example(&self.primary_key_value())
    }

    fn is_deleted(&self) -> bool {
        self.base().is_deleted()
    }
}
