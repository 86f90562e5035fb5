//! Ledger of applied migrations.
//!
//! One row per applied unit in `schema_migrations`, holding the fingerprint
//! of the forward script that was applied and a copy of its down script.
//! The table is created by the first migration unit, not by this module.

use chrono::NaiveDateTime;
use duckdb::Connection;
use ll_core::MigrationId;
use ll_db::{introspect, DbError, DbResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

/// `applied_at` is written with microsecond precision, which is what a
/// DuckDB `TIMESTAMP` holds.
const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Accepts DuckDB's VARCHAR rendering, with or without fractional seconds.
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One applied migration as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: MigrationId,
    /// Fingerprint of the forward script that was applied
    pub checksum: String,
    /// UTC time of application (or of the last repair)
    pub applied_at: NaiveDateTime,
    /// Down script as it was when applied
    pub down_sql: String,
}

/// How [`record_applied`] writes a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Insert a new row. Fails if the id is already recorded.
    Insert,
    /// Overwrite checksum, timestamp, and down script of an existing row.
    /// Only the repair path uses this.
    Overwrite,
}

/// Read every ledger row, keyed by id.
///
/// A store whose first unit has not been applied yet has no ledger table;
/// that reads as an empty ledger.
pub fn list_applied(conn: &Connection) -> DbResult<BTreeMap<MigrationId, LedgerEntry>> {
    if !introspect::table_exists(conn, LEDGER_TABLE)? {
        return Ok(BTreeMap::new());
    }

    let mut stmt = conn
        .prepare(&format!(
            "SELECT id, checksum, CAST(applied_at AS VARCHAR), down_sql FROM {LEDGER_TABLE} ORDER BY id"
        ))
        .map_err(|e| DbError::QueryError(format!("failed to read ledger: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| DbError::QueryError(format!("failed to read ledger: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::QueryError(format!("ledger row error: {e}")))?;

    let mut entries = BTreeMap::new();
    for (id, checksum, applied_at, down_sql) in rows {
        let id = MigrationId::from_ledger(id)
            .ok_or_else(|| DbError::QueryError("ledger row with an empty id".to_string()))?;
        let applied_at = NaiveDateTime::parse_from_str(&applied_at, TIMESTAMP_READ_FORMAT)
            .map_err(|e| {
                DbError::QueryError(format!(
                    "ledger row {id} has unreadable applied_at '{applied_at}': {e}"
                ))
            })?;
        entries.insert(
            id.clone(),
            LedgerEntry {
                id,
                checksum,
                applied_at,
                down_sql,
            },
        );
    }
    Ok(entries)
}

/// Write a single ledger row.
pub fn record_applied(conn: &Connection, entry: &LedgerEntry, mode: WriteMode) -> DbResult<()> {
    let applied_at = entry.applied_at.format(TIMESTAMP_WRITE_FORMAT).to_string();

    match mode {
        WriteMode::Insert => {
            conn.execute(
                &format!(
                    "INSERT INTO {LEDGER_TABLE} (id, checksum, applied_at, down_sql) \
                     VALUES (?, ?, CAST(? AS TIMESTAMP), ?)"
                ),
                duckdb::params![entry.id.as_str(), entry.checksum, applied_at, entry.down_sql],
            )
            .map_err(|e| DbError::ExecutionError(format!("failed to record {}: {e}", entry.id)))?;
        }
        WriteMode::Overwrite => {
            let updated = conn
                .execute(
                    &format!(
                        "UPDATE {LEDGER_TABLE} \
                         SET checksum = ?, applied_at = CAST(? AS TIMESTAMP), down_sql = ? \
                         WHERE id = ?"
                    ),
                    duckdb::params![entry.checksum, applied_at, entry.down_sql, entry.id.as_str()],
                )
                .map_err(|e| {
                    DbError::ExecutionError(format!("failed to overwrite {}: {e}", entry.id))
                })?;
            if updated != 1 {
                return Err(DbError::ExecutionError(format!(
                    "expected to overwrite one ledger row for {}, updated {updated}",
                    entry.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
