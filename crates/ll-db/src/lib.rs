//! ll-db - Store handle for Liftlog
//!
//! This crate wraps the DuckDB connection that backs the workout store and
//! provides the transaction helper and catalog introspection the migration
//! engine builds on.

pub mod error;
pub mod introspect;
pub mod store;

pub use error::{DbError, DbResult};
pub use store::Store;
