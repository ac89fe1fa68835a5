//! # crudbase-entity
//!
//! The contract between business entities and the data-access layer. An
//! entity type implements [`Entity`], declares its table through a static
//! [`EntityMeta`], and embeds [`BaseFields`] for the soft-delete flag and
//! audit columns shared by every table.

pub mod base;
pub mod entity;
pub mod meta;

pub use base::{BASE_COLUMNS, BaseFields};
pub use entity::Entity;
pub use meta::{ColumnDef, ColumnType, EntityMeta};
