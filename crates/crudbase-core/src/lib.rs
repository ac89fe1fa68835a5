//! # crudbase-core
//!
//! Core crate for crudbase. Contains the unified error system, configuration
//! schemas, dynamic SQL values and records, the criteria builder, pagination
//! value objects, and the collaborator traits implemented by stores.
//!
//! This crate has **no** internal dependencies on other crudbase crates.

pub mod config;
pub mod error;
pub mod messages;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
