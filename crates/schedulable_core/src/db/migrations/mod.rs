//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Visibility columns are added through `db::schema`, never by hand-written
//!   `ALTER TABLE` text.
//! - Precision only affects columns added by the run that adds them; existing
//!   columns are never redeclared.

use crate::db::schema::{add_schedule_at_column, ScheduleColumn};
use crate::db::{DbError, DbResult};
use crate::model::post::Post;
use crate::schedulable::HasVisibilitySchedule;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
enum MigrationStep {
    Sql(&'static str),
    AddScheduleAt {
        table: &'static str,
        column: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: MigrationStep::Sql(include_str!("0001_posts.sql")),
    },
    Migration {
        version: 2,
        step: MigrationStep::AddScheduleAt {
            table: <Post as HasVisibilitySchedule>::TABLE,
            column: <Post as HasVisibilitySchedule>::SCHEDULE_AT_COLUMN,
        },
    },
    Migration {
        version: 3,
        step: MigrationStep::Sql(include_str!("0003_posts_schedule_at_index.sql")),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations with second-precision visibility columns.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    apply_migrations_with(conn, 0)
}

/// Applies all pending migrations; visibility columns added along the way
/// are declared with `schedule_at_precision` fractional digits.
pub fn apply_migrations_with(conn: &mut Connection, schedule_at_precision: u8) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        match migration.step {
            MigrationStep::Sql(sql) => tx.execute_batch(sql)?,
            MigrationStep::AddScheduleAt { table, column } => add_schedule_at_column(
                &tx,
                table,
                &ScheduleColumn::named(column).with_precision(schedule_at_precision),
            )?,
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
