//! # crudbase-database
//!
//! Stores for entity types and the generic repository layered on top of
//! them. [`PgStore`] talks to PostgreSQL through `sqlx`; [`MemoryStore`]
//! keeps rows in process and evaluates criteria directly. Both implement
//! the collaborator traits of `crudbase-core`, so a [`BaseRepository`]
//! works with either.

pub mod bulk;
pub mod connection;
pub mod exclusive;
pub mod memory;
pub mod migration;
pub mod paging;
pub mod repository;
pub mod row;
pub mod sql;
pub mod store;

pub use connection::{DatabasePool, DbHandle};
pub use memory::MemoryStore;
pub use paging::do_select_page_info;
pub use repository::{BaseRepository, NamedQueries, ReconcileOutcome};
pub use store::PgStore;
