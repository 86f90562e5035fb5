//! Schema migration engine for the Liftlog store.
//!
//! Loads ordered migration units from a directory, applies the ones the
//! ledger has not seen (one transaction each), verifies the fingerprints of
//! the ones it has, and repairs the single recognised legacy fingerprint
//! instead of refusing to start. Any other drift is a hard failure.

pub mod checksum;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod loader;
pub mod plan;
pub mod repair;

pub use checksum::fingerprint;
pub use error::{ErrorKind, MigrateError, MigrateResult};
pub use executor::{run_migrations, MigrationReport, Migrator};
pub use ledger::{LedgerEntry, WriteMode, LEDGER_TABLE};
pub use loader::{load_units, MigrationUnit};
pub use plan::{plan, MigrationPlan, UnitState, UnitStatus};
pub use repair::{LegacyRepair, RepairRegistry, SchemaObject};

#[cfg(test)]
pub(crate) mod test_utils;
