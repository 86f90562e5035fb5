//! Read-only comparison of migration units against the ledger.
//!
//! [`classify`] is the decision the executor makes for each unit; [`plan`]
//! runs it for every unit without writing anything, for status reporting.

use crate::error::MigrateResult;
use crate::ledger::{self, LedgerEntry};
use crate::loader::MigrationUnit;
use crate::repair::{LegacyRepair, RepairRegistry};
use chrono::NaiveDateTime;
use ll_core::MigrationId;
use ll_db::Store;
use serde::Serialize;
use std::collections::BTreeMap;

/// What the executor will do with a unit.
#[derive(Debug)]
pub(crate) enum Action<'r> {
    /// Not in the ledger
    Apply,
    /// Recorded with the current fingerprint
    Skip,
    /// Recorded under a recognised legacy fingerprint
    Repair(&'r LegacyRepair),
    /// Recorded under an unrecognised fingerprint
    Reject { recorded: String },
}

pub(crate) fn classify<'r>(
    unit: &MigrationUnit,
    current: &str,
    recorded: Option<&LedgerEntry>,
    repairs: &'r RepairRegistry,
) -> Action<'r> {
    match recorded {
        None => Action::Apply,
        Some(entry) if entry.checksum == current => Action::Skip,
        Some(entry) => match repairs.lookup(unit.id.as_str(), &entry.checksum) {
            Some(repair) => Action::Repair(repair),
            None => Action::Reject {
                recorded: entry.checksum.clone(),
            },
        },
    }
}

/// Ledger ids with no corresponding unit.
pub(crate) fn orphaned_ids(
    units: &[MigrationUnit],
    ledger: &BTreeMap<MigrationId, LedgerEntry>,
) -> Vec<MigrationId> {
    ledger
        .keys()
        .filter(|id| !units.iter().any(|u| &u.id == *id))
        .cloned()
        .collect()
}

/// State of a single unit relative to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnitState {
    Pending,
    UpToDate,
    /// Recorded under a legacy fingerprint the registry knows how to repair
    Repairable { recorded: String },
    /// Recorded under a fingerprint nothing accounts for
    Drifted { recorded: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub id: MigrationId,
    /// Fingerprint of the definition on disk
    pub checksum: String,
    #[serde(flatten)]
    pub state: UnitState,
    pub applied_at: Option<NaiveDateTime>,
}

/// Status of every unit, plus ledger rows nothing on disk accounts for.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub units: Vec<UnitStatus>,
    pub orphaned: Vec<MigrationId>,
}

impl MigrationPlan {
    /// True when a run would not hit an integrity failure.
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty()
            && !self
                .units
                .iter()
                .any(|u| matches!(u.state, UnitState::Drifted { .. }))
    }

    /// Units a run would apply.
    pub fn pending(&self) -> impl Iterator<Item = &UnitStatus> {
        self.units
            .iter()
            .filter(|u| matches!(u.state, UnitState::Pending))
    }

    /// Units a run would repair.
    pub fn repairable(&self) -> impl Iterator<Item = &UnitStatus> {
        self.units
            .iter()
            .filter(|u| matches!(u.state, UnitState::Repairable { .. }))
    }

    /// True when a run would perform no writes.
    pub fn is_up_to_date(&self) -> bool {
        self.is_clean()
            && self
                .units
                .iter()
                .all(|u| matches!(u.state, UnitState::UpToDate))
    }
}

/// Classify every unit against the store's ledger. Performs no writes.
pub fn plan(
    store: &Store,
    units: &[MigrationUnit],
    repairs: &RepairRegistry,
) -> MigrateResult<MigrationPlan> {
    let ledger = ledger::list_applied(store.conn())?;

    let statuses = units
        .iter()
        .map(|unit| {
            let current = unit.fingerprint();
            let recorded = ledger.get(&unit.id);
            let state = match classify(unit, &current, recorded, repairs) {
                Action::Apply => UnitState::Pending,
                Action::Skip => UnitState::UpToDate,
                Action::Repair(repair) => UnitState::Repairable {
                    recorded: repair.legacy_checksum.clone(),
                },
                Action::Reject { recorded } => UnitState::Drifted { recorded },
            };
            UnitStatus {
                id: unit.id.clone(),
                checksum: current,
                state,
                applied_at: recorded.map(|e| e.applied_at),
            }
        })
        .collect();

    Ok(MigrationPlan {
        units: statuses,
        orphaned: orphaned_ids(units, &ledger),
    })
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
