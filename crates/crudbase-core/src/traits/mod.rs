//! Collaborator traits defined in `crudbase-core` and implemented by stores.

pub mod bulk;
pub mod dao;
pub mod query;
pub mod unit_of_work;

pub use bulk::BulkDao;
pub use dao::Dao;
pub use query::VoQuery;
pub use unit_of_work::UnitOfWork;
