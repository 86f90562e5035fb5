//! Migrate command implementation

use anyhow::{Context, Result};
use ll_migrate::{load_units, MigrateError, Migrator};

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common;

/// Execute the migrate command.
pub fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let settings = common::load_settings(global)?;
    log::debug!(
        "Store: {:?}, migrations: {}",
        settings.database,
        settings.migrations_dir.display()
    );

    // Load everything before the store file is created.
    let units = load_units(&settings.migrations_dir).map_err(aborted)?;
    let store = common::open_store(&settings.database)?;
    let report = Migrator::new(&store, &units).run().map_err(aborted)?;

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Text if report.changed() => {
            println!(
                "Applied {}, repaired {}, {} already up to date",
                report.applied.len(),
                report.repaired.len(),
                report.up_to_date.len()
            );
        }
        OutputFormat::Text => println!("Schema is up to date"),
    }
    Ok(())
}

fn aborted(err: MigrateError) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!("Migration run aborted ({kind:?} error)"))
}
