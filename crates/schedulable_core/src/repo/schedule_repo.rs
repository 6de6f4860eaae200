//! Schedulable entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist any `SqlEntity` with its visibility instant.
//! - Run scoped reads built by `EntityQuery`.
//!
//! # Invariants
//! - Identity lookups go through the same scoped query path as listings, so
//!   the default scope also hides pending records from `find`.
//! - Read paths reject malformed persisted ids/instants instead of masking
//!   them.
//! - The repository refuses connections whose schema is not ready.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::schema::{has_column, has_table};
use crate::db::DbError;
use crate::model::schedule_at::ScheduleAt;
use crate::query::{EntityQuery, ScheduleScope};
use crate::repo::entity::SqlEntity;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for schedulable entity persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Save contract consumed by lifecycle operations.
pub trait EntityStore<E> {
    /// Inserts or updates `entity`, including its visibility instant.
    fn save(&self, entity: &E) -> RepoResult<()>;
}

impl<E, S: EntityStore<E> + ?Sized> EntityStore<E> for &S {
    fn save(&self, entity: &E) -> RepoResult<()> {
        (**self).save(entity)
    }
}

/// Scoped read/write repository for one entity type.
///
/// `now` is passed in by the caller so one evaluation uses one instant.
pub trait ScheduleRepository<E>: EntityStore<E> {
    /// Finds one record by id under the default scope.
    fn find(&self, id: Uuid, now: ScheduleAt) -> RepoResult<Option<E>> {
        self.find_with_scope(id, ScheduleScope::Default, now)
    }

    fn find_with_scope(
        &self,
        id: Uuid,
        scope: ScheduleScope,
        now: ScheduleAt,
    ) -> RepoResult<Option<E>>;

    fn list(&self, query: &EntityQuery<E>, now: ScheduleAt) -> RepoResult<Vec<E>>;

    fn count(&self, query: &EntityQuery<E>, now: ScheduleAt) -> RepoResult<u64>;

    /// Hard-deletes one record regardless of scope.
    fn delete(&self, id: Uuid) -> RepoResult<()>;
}

/// SQLite-backed repository for any `SqlEntity`.
pub struct SqliteScheduleRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: SqlEntity> SqliteScheduleRepository<'conn, E> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the entity's
    ///   table lacks the id, a data column, or the visibility column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready::<E>(conn)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }
}

impl<E: SqlEntity> EntityStore<E> for SqliteScheduleRepository<'_, E> {
    fn save(&self, entity: &E) -> RepoResult<()> {
        let mut columns = vec![E::ID_COLUMN];
        columns.extend_from_slice(E::DATA_COLUMNS);
        columns.push(E::SCHEDULE_AT_COLUMN);

        let mut values = Vec::with_capacity(columns.len());
        values.push(Value::Text(entity.id().to_string()));
        let data = entity.data_values();
        if data.len() != E::DATA_COLUMNS.len() {
            return Err(RepoError::InvalidData(format!(
                "{} data values for {} columns in {}",
                data.len(),
                E::DATA_COLUMNS.len(),
                E::TABLE
            )));
        }
        values.extend(data);
        values.push(match entity.schedule_at() {
            Some(at) => Value::Text(at.to_string()),
            None => Value::Null,
        });

        let placeholders = vec!["?"; columns.len()].join(", ");
        let mut assignments: Vec<String> = columns[1..]
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();
        if let Some(updated_at) = E::UPDATED_AT_COLUMN {
            assignments.push(format!(
                "{updated_at} = (strftime('%s', 'now') * 1000)"
            ));
        }

        let sql = format!(
            "INSERT INTO {table} ({columns}) VALUES ({placeholders})
             ON CONFLICT({id}) DO UPDATE SET {assignments};",
            table = E::TABLE,
            columns = columns.join(", "),
            id = E::ID_COLUMN,
            assignments = assignments.join(", "),
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }
}

impl<E: SqlEntity> ScheduleRepository<E> for SqliteScheduleRepository<'_, E> {
    fn find_with_scope(
        &self,
        id: Uuid,
        scope: ScheduleScope,
        now: ScheduleAt,
    ) -> RepoResult<Option<E>> {
        let query = EntityQuery::<E>::by_id(id).with_scope(scope).limit(1);
        Ok(self.list(&query, now)?.into_iter().next())
    }

    fn list(&self, query: &EntityQuery<E>, now: ScheduleAt) -> RepoResult<Vec<E>> {
        let rendered = query.to_select_sql(now)?;
        let mut stmt = self.conn.prepare(&rendered.sql)?;
        let mut rows = stmt.query(params_from_iter(rendered.params))?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row::<E>(row)?);
        }

        Ok(entities)
    }

    fn count(&self, query: &EntityQuery<E>, now: ScheduleAt) -> RepoResult<u64> {
        let rendered = query.to_count_sql(now)?;
        let count: i64 = self.conn.query_row(
            &rendered.sql,
            params_from_iter(rendered.params),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }

    fn delete(&self, id: Uuid) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", E::TABLE, E::ID_COLUMN),
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_entity_row<E: SqlEntity>(row: &Row<'_>) -> RepoResult<E> {
    let id_text: String = row.get(E::ID_COLUMN)?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{id_text}` in {}.{}",
            E::TABLE,
            E::ID_COLUMN
        ))
    })?;

    let schedule_at = match row.get::<_, Option<String>>(E::SCHEDULE_AT_COLUMN)? {
        Some(value) => Some(value.parse::<ScheduleAt>().map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid schedule time `{value}` in {}.{}",
                E::TABLE,
                E::SCHEDULE_AT_COLUMN
            ))
        })?),
        None => None,
    };

    E::from_row(id, schedule_at, row)
}

fn ensure_connection_ready<E: SqlEntity>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !has_table(conn, E::TABLE)? {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    let required = std::iter::once(E::ID_COLUMN)
        .chain(E::DATA_COLUMNS.iter().copied())
        .chain(std::iter::once(E::SCHEDULE_AT_COLUMN))
        .chain(E::UPDATED_AT_COLUMN);
    for column in required {
        if !has_column(conn, E::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }

    Ok(())
}
