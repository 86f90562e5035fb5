//! Store handle.
//!
//! [`Store`] owns the DuckDB [`Connection`] the application persists its
//! workout data in. Callers construct one explicitly and pass it around;
//! there is no process-wide handle.

use crate::error::{DbError, DbResult};
use crate::introspect;
use duckdb::Connection;
use ll_core::DatabaseLocation;
use std::path::Path;

/// Wrapper around a DuckDB connection to the workout store.
///
/// Single-threaded. Migrations run sequentially at startup.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a file-backed store at `path`.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        log::debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Create an isolated in-memory store.
    pub fn open_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open the store at a resolved [`DatabaseLocation`].
    pub fn open_location(location: &DatabaseLocation) -> DbResult<Self> {
        match location {
            DatabaseLocation::Memory => Self::open_memory(),
            DatabaseLocation::File(path) => Self::open(path),
        }
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    ///
    /// The error type is the caller's, so engine code can return its own
    /// errors from `body` and still get store failures converted.
    pub fn transaction<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    ))
                    .into());
                }
            }
            Err(_) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("ROLLBACK failed: {rollback_err}");
                }
            }
        }
        result
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> DbResult<bool> {
        introspect::table_exists(&self.conn, name)
    }

    /// Check if a table has the given column
    pub fn column_exists(&self, table: &str, column: &str) -> DbResult<bool> {
        introspect::column_exists(&self.conn, table, column)
    }

    /// Check if an explicitly created index exists
    pub fn index_exists(&self, name: &str) -> DbResult<bool> {
        introspect::index_exists(&self.conn, name)
    }

    /// Column names of `table` in ordinal order
    pub fn table_columns(&self, table: &str) -> DbResult<Vec<String>> {
        introspect::table_columns(&self.conn, table)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
