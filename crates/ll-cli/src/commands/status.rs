//! Status command implementation
//!
//! Compares the migration files against the ledger without writing.

use anyhow::{Context, Result};
use ll_db::Store;
use ll_migrate::{load_units, plan, MigrationPlan, RepairRegistry, UnitState};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{self, ExitCode};

/// Execute the status command.
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let settings = common::load_settings(global)?;
    let units = load_units(&settings.migrations_dir).context("Failed to load migrations")?;

    // A store that does not exist yet has an empty ledger.
    let store = match common::open_existing_store(&settings.database)? {
        Some(store) => store,
        None => Store::open_memory().context("Failed to open scratch store")?,
    };

    let plan = plan(&store, &units, &RepairRegistry::builtin()).context("Failed to read ledger")?;

    match args.output {
        StatusOutput::Json => {
            let json = serde_json::to_string_pretty(&plan).context("Failed to serialize status")?;
            println!("{json}");
        }
        StatusOutput::Table => print_plan(&plan),
    }

    if args.check && !plan.is_clean() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn state_label(state: &UnitState) -> &'static str {
    match state {
        UnitState::Pending => "pending",
        UnitState::UpToDate => "applied",
        UnitState::Repairable { .. } => "repairable",
        UnitState::Drifted { .. } => "DRIFTED",
    }
}

fn print_plan(plan: &MigrationPlan) {
    let rows: Vec<Vec<String>> = plan
        .units
        .iter()
        .map(|unit| {
            let recorded = match &unit.state {
                UnitState::Repairable { recorded } | UnitState::Drifted { recorded } => {
                    common::short_checksum(recorded)
                }
                _ => String::new(),
            };
            vec![
                unit.id.to_string(),
                state_label(&unit.state).to_string(),
                common::short_checksum(&unit.checksum),
                recorded,
                unit.applied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    common::print_table(&["ID", "STATE", "CHECKSUM", "RECORDED", "APPLIED AT"], &rows);

    for id in &plan.orphaned {
        println!("orphaned: ledger row {id} has no migration file");
    }

    println!();
    println!(
        "{} pending, {} repairable, {} orphaned{}",
        plan.pending().count(),
        plan.repairable().count(),
        plan.orphaned.len(),
        if plan.is_clean() { "" } else { " - migrate will fail" }
    );
}
