//! Apply/repair executor.
//!
//! Walks units in id order. Units missing from the ledger are applied and
//! recorded in a single transaction each; units recorded with their current
//! fingerprint are skipped; units recorded under a registered legacy
//! fingerprint are repaired; anything else stops the run.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{self, LedgerEntry, WriteMode};
use crate::loader::{load_units, MigrationUnit};
use crate::plan::{classify, orphaned_ids, Action};
use crate::repair::{self, LegacyRepair, RepairRegistry};
use ll_core::MigrationId;
use ll_db::{DbResult, Store};
use serde::Serialize;
use std::path::Path;

/// What a run did, per unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<MigrationId>,
    pub repaired: Vec<MigrationId>,
    pub up_to_date: Vec<MigrationId>,
}

impl MigrationReport {
    /// True when the run wrote to the store.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty() || !self.repaired.is_empty()
    }
}

/// Load the units in `dir` and bring `store` up to date with them.
///
/// Uses the built-in repair registry. Loading finishes before the store is
/// touched, so a malformed file leaves the store unchanged.
pub fn run_migrations(store: &Store, dir: &Path) -> MigrateResult<MigrationReport> {
    let units = load_units(dir)?;
    Migrator::new(store, &units).run()
}

/// Runs an already-loaded set of units against a store.
pub struct Migrator<'a> {
    store: &'a Store,
    units: &'a [MigrationUnit],
    repairs: RepairRegistry,
}

impl<'a> Migrator<'a> {
    /// Migrator over `units` (ascending id order) with the built-in repairs.
    pub fn new(store: &'a Store, units: &'a [MigrationUnit]) -> Self {
        Self {
            store,
            units,
            repairs: RepairRegistry::builtin(),
        }
    }

    /// Replace the repair registry.
    #[must_use]
    pub fn with_repairs(mut self, repairs: RepairRegistry) -> Self {
        self.repairs = repairs;
        self
    }

    /// Run every unit. Stops at the first error.
    pub fn run(&self) -> MigrateResult<MigrationReport> {
        let ledger = ledger::list_applied(self.store.conn())?;

        if let Some(id) = orphaned_ids(self.units, &ledger).into_iter().next() {
            return Err(MigrateError::OrphanedEntry { id });
        }

        let mut report = MigrationReport::default();
        for unit in self.units {
            let current = unit.fingerprint();
            match classify(unit, &current, ledger.get(&unit.id), &self.repairs) {
                Action::Apply => {
                    self.apply(unit, current)?;
                    report.applied.push(unit.id.clone());
                }
                Action::Skip => {
                    log::debug!("Migration {} is up to date", unit.id);
                    report.up_to_date.push(unit.id.clone());
                }
                Action::Repair(legacy) => {
                    self.repair(unit, legacy, current)?;
                    report.repaired.push(unit.id.clone());
                }
                Action::Reject { recorded } => {
                    log::error!(
                        "Migration {} was applied as {recorded}, definition is now {current}",
                        unit.id
                    );
                    return Err(MigrateError::ChecksumMismatch {
                        id: unit.id.clone(),
                        recorded,
                        current,
                    });
                }
            }
        }

        log::info!(
            "Migrations complete: {} applied, {} repaired, {} up to date",
            report.applied.len(),
            report.repaired.len(),
            report.up_to_date.len()
        );
        Ok(report)
    }

    fn entry_for(unit: &MigrationUnit, checksum: String) -> LedgerEntry {
        LedgerEntry {
            id: unit.id.clone(),
            checksum,
            applied_at: chrono::Utc::now().naive_utc(),
            down_sql: unit.down_sql.clone(),
        }
    }

    /// Execute the forward script and record it, atomically.
    fn apply(&self, unit: &MigrationUnit, checksum: String) -> MigrateResult<()> {
        log::info!("Applying migration {}", unit.id);
        let entry = Self::entry_for(unit, checksum);

        self.store
            .transaction(|conn| -> DbResult<()> {
                conn.execute_batch(&unit.forward_sql)?;
                ledger::record_applied(conn, &entry, WriteMode::Insert)
            })
            .map_err(|source| MigrateError::Apply {
                id: unit.id.clone(),
                source,
            })
    }

    /// Create whatever the legacy form left out, then point the ledger row
    /// at the current definition, atomically.
    fn repair(
        &self,
        unit: &MigrationUnit,
        legacy: &LegacyRepair,
        checksum: String,
    ) -> MigrateResult<()> {
        let entry = Self::entry_for(unit, checksum);

        let created = self
            .store
            .transaction(|conn| -> DbResult<Vec<String>> {
                let created = repair::apply_delta(conn, &legacy.delta)?;
                ledger::record_applied(conn, &entry, WriteMode::Overwrite)?;
                Ok(created.iter().map(|o| o.to_string()).collect())
            })
            .map_err(|source| MigrateError::Repair {
                id: unit.id.clone(),
                source,
            })?;

        let created = if created.is_empty() {
            "nothing missing".to_string()
        } else {
            format!("created {}", created.join(", "))
        };
        log::warn!(
            "Repaired migration {} recorded under legacy checksum {} ({created}); ledger now at {}",
            unit.id,
            legacy.legacy_checksum,
            entry.checksum
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
