//! Shared test utilities for ll-migrate

use crate::loader::{load_units, MigrationUnit, DOWN_MARKER, UP_MARKER};
use ll_db::Store;
use std::path::Path;

/// Ledger DDL, matching the first shipped migration unit.
pub(crate) const LEDGER_DDL: &str = "CREATE TABLE schema_migrations (
    id         VARCHAR PRIMARY KEY,
    checksum   VARCHAR NOT NULL,
    applied_at TIMESTAMP NOT NULL,
    down_sql   VARCHAR NOT NULL
);
";

/// Write a migration file with the given sections into `dir`.
pub(crate) fn write_unit(dir: &Path, id: &str, forward: &str, down: &str) {
    let content = format!("{UP_MARKER}\n{forward}{DOWN_MARKER}\n{down}");
    std::fs::write(dir.join(format!("{id}.sql")), content).unwrap();
}

/// Write the ledger bootstrap unit plus `rest` into `dir` and load them.
pub(crate) fn units_with_ledger(dir: &Path, rest: &[(&str, &str)]) -> Vec<MigrationUnit> {
    write_unit(dir, "0001_schema_migrations", LEDGER_DDL, "DROP TABLE schema_migrations;\n");
    for (id, forward) in rest {
        write_unit(dir, id, forward, "SELECT 1;\n");
    }
    load_units(dir).unwrap()
}

/// Query a single i64 value (convenience for COUNT(*) assertions).
pub(crate) fn count(store: &Store, sql: &str) -> i64 {
    store
        .conn()
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .unwrap()
}

/// Number of ledger rows.
pub(crate) fn ledger_rows(store: &Store) -> i64 {
    count(store, "SELECT COUNT(*) FROM schema_migrations")
}
