//! Row mapping contract for schedulable entities.

use crate::model::schedule_at::ScheduleAt;
use crate::repo::schedule_repo::RepoResult;
use crate::schedulable::HasVisibilitySchedule;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

/// Maps an entity type to one SQLite table.
///
/// Id and visibility columns are handled by the generic repository; the
/// implementor only maps its own data columns.
pub trait SqlEntity: HasVisibilitySchedule + Sized {
    const ID_COLUMN: &'static str = "id";
    /// Data columns in the order `data_values` returns them.
    const DATA_COLUMNS: &'static [&'static str];
    /// Column refreshed on every save, if the table keeps one.
    const UPDATED_AT_COLUMN: Option<&'static str> = None;

    fn id(&self) -> Uuid;

    fn data_values(&self) -> Vec<Value>;

    /// Builds an entity from a row selected with columns aliased to their
    /// bare names.
    fn from_row(id: Uuid, schedule_at: Option<ScheduleAt>, row: &Row<'_>) -> RepoResult<Self>;
}
