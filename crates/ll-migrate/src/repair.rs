//! Drift repair for recognised legacy fingerprints.
//!
//! When a unit's definition is corrected after some stores already applied
//! the old form, those stores carry the old fingerprint in their ledger.
//! Re-running the corrected script is unsafe (parts of it already exist), so
//! each known case is registered here as an additive delta: every table,
//! column, and index the corrected script introduces, created only if
//! missing.
//!
//! The registry is keyed by `(unit id, legacy checksum)`. A mismatch that is
//! not registered is never repaired.

use duckdb::Connection;
use ll_db::{introspect, DbError, DbResult};

/// One schema object a repair delta guarantees exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    /// A table, created with `ddl` when absent
    Table { name: String, ddl: String },
    /// A column, added with `ALTER TABLE ... ADD COLUMN` when absent
    Column {
        table: String,
        column: String,
        column_type: String,
    },
    /// An index, created with `ddl` when absent
    Index { name: String, ddl: String },
}

impl SchemaObject {
    pub fn table(name: impl Into<String>, ddl: impl Into<String>) -> Self {
        SchemaObject::Table {
            name: name.into(),
            ddl: ddl.into(),
        }
    }

    pub fn column(
        table: impl Into<String>,
        column: impl Into<String>,
        column_type: impl Into<String>,
    ) -> Self {
        SchemaObject::Column {
            table: table.into(),
            column: column.into(),
            column_type: column_type.into(),
        }
    }

    pub fn index(name: impl Into<String>, ddl: impl Into<String>) -> Self {
        SchemaObject::Index {
            name: name.into(),
            ddl: ddl.into(),
        }
    }

    /// Whether the object is already present in the store.
    pub fn exists(&self, conn: &Connection) -> DbResult<bool> {
        match self {
            SchemaObject::Table { name, .. } => introspect::table_exists(conn, name),
            SchemaObject::Column { table, column, .. } => {
                introspect::column_exists(conn, table, column)
            }
            SchemaObject::Index { name, .. } => introspect::index_exists(conn, name),
        }
    }

    fn create(&self, conn: &Connection) -> DbResult<()> {
        let sql = match self {
            SchemaObject::Table { ddl, .. } | SchemaObject::Index { ddl, .. } => ddl.clone(),
            SchemaObject::Column {
                table,
                column,
                column_type,
            } => format!("ALTER TABLE {table} ADD COLUMN {column} {column_type}"),
        };
        conn.execute_batch(&sql)
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }
}

impl std::fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaObject::Table { name, .. } => write!(f, "table {name}"),
            SchemaObject::Column { table, column, .. } => write!(f, "column {table}.{column}"),
            SchemaObject::Index { name, .. } => write!(f, "index {name}"),
        }
    }
}

/// A recognised legacy fingerprint and the delta that brings a store that
/// applied it up to the current definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRepair {
    pub id: String,
    pub legacy_checksum: String,
    /// Applied in order
    pub delta: Vec<SchemaObject>,
}

/// Lookup table of recognised legacy fingerprints.
#[derive(Debug, Clone, Default)]
pub struct RepairRegistry {
    repairs: Vec<LegacyRepair>,
}

/// Fingerprint of the first revision of `0003_session_set_tracking`, which
/// only added `session_sets.band_label`.
const SESSION_SET_TRACKING_V1: &str =
    "5c5f85e5ff32c2f2a4cda439d0b0b02128c98934006f2a14739465db92ec6c5b";

impl RepairRegistry {
    /// A registry that recognises nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The repairs shipped with the application.
    pub fn builtin() -> Self {
        Self::empty().register(LegacyRepair {
            id: "0003_session_set_tracking".to_string(),
            legacy_checksum: SESSION_SET_TRACKING_V1.to_string(),
            delta: vec![
                SchemaObject::column("session_sets", "band_label", "VARCHAR"),
                SchemaObject::column("session_sets", "started_at", "TIMESTAMP"),
                SchemaObject::column("session_sets", "completed_at", "TIMESTAMP"),
                SchemaObject::table(
                    "resistance_bands",
                    "CREATE TABLE resistance_bands (
                        id            BIGINT PRIMARY KEY,
                        label         VARCHAR NOT NULL,
                        resistance_kg DOUBLE,
                        color         VARCHAR
                    )",
                ),
                SchemaObject::index(
                    "idx_resistance_bands_label",
                    "CREATE UNIQUE INDEX idx_resistance_bands_label ON resistance_bands (label)",
                ),
            ],
        })
    }

    /// Add a repair.
    pub fn register(mut self, repair: LegacyRepair) -> Self {
        self.repairs.push(repair);
        self
    }

    /// Find the repair for `id` recorded under `checksum`, if any.
    pub fn lookup(&self, id: &str, checksum: &str) -> Option<&LegacyRepair> {
        self.repairs
            .iter()
            .find(|r| r.id == id && r.legacy_checksum == checksum)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LegacyRepair> {
        self.repairs.iter()
    }

    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// Create every object in `delta` that does not exist yet.
///
/// Returns the objects that were created. Runs on whatever connection it is
/// given; the caller owns the transaction.
pub fn apply_delta<'d>(
    conn: &Connection,
    delta: &'d [SchemaObject],
) -> DbResult<Vec<&'d SchemaObject>> {
    let mut created = Vec::new();
    for object in delta {
        if object.exists(conn)? {
            log::debug!("Repair: {object} already present");
            continue;
        }
        object.create(conn)?;
        created.push(object);
    }
    Ok(created)
}

#[cfg(test)]
#[path = "repair_test.rs"]
mod tests;
