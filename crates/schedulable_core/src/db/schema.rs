//! Schema helpers for the visibility column.
//!
//! # Responsibility
//! - Add a nullable timestamp column that holds a record's visibility
//!   instant, and drop it again.
//! - Inspect tables/columns so repositories can verify their storage shape.
//!
//! # Invariants
//! - Table and column names must match `[A-Za-z_][A-Za-z0-9_]*`; anything
//!   else is rejected before reaching SQL.
//! - The added column is always nullable with no default, so existing rows
//!   stay visible.

use crate::db::{DbError, DbResult};
use crate::schedulable::DEFAULT_SCHEDULE_AT_COLUMN;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

/// Highest fractional-second precision accepted in a column declaration.
pub const MAX_SCHEDULE_AT_PRECISION: u8 = 6;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Declaration of a visibility column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleColumn {
    pub name: String,
    /// Fractional-second precision of the declared type (0 = whole seconds).
    pub precision: u8,
}

impl Default for ScheduleColumn {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCHEDULE_AT_COLUMN.to_string(),
            precision: 0,
        }
    }
}

impl ScheduleColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision.min(MAX_SCHEDULE_AT_PRECISION);
        self
    }

    /// SQL type declaration, e.g. `TIMESTAMP(0)`.
    pub fn type_declaration(&self) -> String {
        format!("TIMESTAMP({})", self.precision)
    }
}

/// Returns whether `value` is safe to interpolate as a SQL identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

/// Rejects identifiers that are not plain SQL names.
pub fn ensure_identifier(value: &str) -> DbResult<()> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(value.to_string()))
    }
}

/// Builds the `ALTER TABLE ... ADD COLUMN` statement for `column`.
pub fn add_schedule_at_sql(table: &str, column: &ScheduleColumn) -> DbResult<String> {
    ensure_identifier(table)?;
    ensure_identifier(&column.name)?;
    Ok(format!(
        "ALTER TABLE {table} ADD COLUMN {} {} NULL;",
        column.name,
        column.type_declaration()
    ))
}

/// Builds the `ALTER TABLE ... DROP COLUMN` statement for `column`.
pub fn drop_schedule_at_sql(table: &str, column: &str) -> DbResult<String> {
    ensure_identifier(table)?;
    ensure_identifier(column)?;
    Ok(format!("ALTER TABLE {table} DROP COLUMN {column};"))
}

/// Adds a nullable visibility column to `table`.
pub fn add_schedule_at_column(
    conn: &Connection,
    table: &str,
    column: &ScheduleColumn,
) -> DbResult<()> {
    let sql = add_schedule_at_sql(table, column)?;
    conn.execute_batch(&sql)?;
    Ok(())
}

/// Drops the visibility column from `table`.
pub fn drop_schedule_at_column(conn: &Connection, table: &str, column: &str) -> DbResult<()> {
    let sql = drop_schedule_at_sql(table, column)?;
    conn.execute_batch(&sql)?;
    Ok(())
}

/// Returns whether `table` exists in the main schema.
pub fn has_table(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether `table` has a column named `column`.
pub fn has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    ensure_identifier(table)?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        if name.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}
