//! Catalog introspection used for create-if-missing schema changes.
//!
//! All lookups go through the connection that is passed in, so inside a
//! transaction they see that transaction's uncommitted DDL.

use crate::error::{DbError, DbResult};
use duckdb::Connection;

/// Schema that unqualified table names resolve to.
const DEFAULT_SCHEMA: &str = "main";

fn split_qualified(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((schema, table)) => (schema, table),
        None => (DEFAULT_SCHEMA, name),
    }
}

fn query_exists(conn: &Connection, sql: &str, params: &[&str]) -> DbResult<bool> {
    let count: i64 = conn
        .query_row(sql, duckdb::params_from_iter(params.iter().copied()), |row| row.get(0))
        .map_err(|e| DbError::QueryError(format!("catalog lookup failed: {e}")))?;
    Ok(count > 0)
}

/// Check if a table exists (optionally schema-qualified)
pub fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    let (schema, table) = split_qualified(name);
    query_exists(
        conn,
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = ? AND table_name = ? AND table_type = 'BASE TABLE'",
        &[schema, table],
    )
}

/// Check if `table` has a column named `column`
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let (schema, table) = split_qualified(table);
    query_exists(
        conn,
        "SELECT COUNT(*) FROM information_schema.columns \
         WHERE table_schema = ? AND table_name = ? AND column_name = ?",
        &[schema, table, column],
    )
}

/// Check if an explicitly created index exists.
///
/// Indexes backing PRIMARY KEY / UNIQUE constraints are not catalog entries
/// and are not reported here.
pub fn index_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    query_exists(
        conn,
        "SELECT COUNT(*) FROM duckdb_indexes() WHERE index_name = ?",
        &[name],
    )
}

/// List the column names of `table` in ordinal order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let (schema, table) = split_qualified(table);
    let mut stmt = conn
        .prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )
        .map_err(|e| DbError::QueryError(format!("catalog lookup failed: {e}")))?;
    let columns = stmt
        .query_map(duckdb::params![schema, table], |row| row.get::<_, String>(0))
        .map_err(|e| DbError::QueryError(format!("catalog lookup failed: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::QueryError(format!("row error: {e}")))?;
    Ok(columns)
}
