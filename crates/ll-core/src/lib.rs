//! ll-core - Core library for Liftlog
//!
//! This crate provides shared types used across all Liftlog components:
//! project configuration (`liftlog.yml`), strongly-typed migration
//! identifiers, and the core error type.

pub mod config;
pub mod error;
pub mod migration_id;

pub use config::{Config, DatabaseConfig, DatabaseLocation, MigrationsConfig};
pub use error::{CoreError, CoreResult};
pub use migration_id::MigrationId;
