//! Ledger command implementation

use anyhow::{bail, Context, Result};
use ll_migrate::ledger::{list_applied, LedgerEntry};

use crate::cli::{GlobalArgs, LedgerArgs, StatusOutput};
use crate::commands::common;

/// Execute the ledger command.
pub fn execute(args: &LedgerArgs, global: &GlobalArgs) -> Result<()> {
    let settings = common::load_settings(global)?;
    let Some(store) = common::open_existing_store(&settings.database)? else {
        bail!("Store not found. Run `liftlog migrate` first.");
    };

    let ledger = list_applied(store.conn()).context("Failed to read ledger")?;

    let entries: Vec<&LedgerEntry> = match &args.id {
        Some(id) => match ledger.get(id.as_str()) {
            Some(entry) => vec![entry],
            None => bail!("Ledger has no row for migration {id}"),
        },
        None => ledger.values().collect(),
    };

    match args.output {
        StatusOutput::Json => {
            let json =
                serde_json::to_string_pretty(&entries).context("Failed to serialize ledger")?;
            println!("{json}");
        }
        StatusOutput::Table => {
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        common::short_checksum(&e.checksum),
                        e.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]
                })
                .collect();
            common::print_table(&["ID", "CHECKSUM", "APPLIED AT"], &rows);

            if args.show_down {
                for entry in &entries {
                    println!("\n-- {} (down)\n{}", entry.id, entry.down_sql.trim_end());
                }
            }
        }
    }
    Ok(())
}
