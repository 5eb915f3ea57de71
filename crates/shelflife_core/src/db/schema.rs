//! Create-if-missing schema for the structured backend.
//!
//! # Responsibility
//! - Ensure the `items` and `preferences` tables exist with declared defaults.
//!
//! # Invariants
//! - Every statement is `IF NOT EXISTS`; repeated calls are no-ops.
//! - `items.id` uses AUTOINCREMENT so ids are never reused after deletes.

use super::DbResult;
use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Ensures the item schema exists on the provided connection.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Returns whether a table with the given name exists.
pub fn table_exists(conn: &Connection, table_name: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
