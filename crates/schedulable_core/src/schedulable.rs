//! Visibility-schedule capability for persisted entities.
//!
//! # Responsibility
//! - Define the contract an entity type implements to gain a deferred
//!   visibility instant.
//! - Provide the in-memory operations (`*_without_saving`, state checks)
//!   shared by every adopting type.
//!
//! # Invariants
//! - The column name is resolved once per type through an associated const.
//! - Inside query predicates the column is always table-qualified.
//! - State checks compare against a single `now` read from the given clock.

use crate::clock::Clock;
use crate::model::schedule_at::{normalize_schedule_input, ScheduleAt, ScheduleState};

/// Column used when an entity type does not override `SCHEDULE_AT_COLUMN`.
pub const DEFAULT_SCHEDULE_AT_COLUMN: &str = "schedule_at";

/// Returns `<table>.<column>`.
pub fn qualify_column(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

/// Entity types whose visibility in default reads can be deferred.
///
/// Implementors only provide storage location and attribute access; every
/// other method has a default.
pub trait HasVisibilitySchedule {
    /// Table the entity is stored in.
    const TABLE: &'static str;
    /// Column holding the visibility instant.
    const SCHEDULE_AT_COLUMN: &'static str = DEFAULT_SCHEDULE_AT_COLUMN;

    fn schedule_at(&self) -> Option<ScheduleAt>;

    fn set_schedule_at(&mut self, value: Option<ScheduleAt>);

    fn schedule_at_column() -> &'static str
    where
        Self: Sized,
    {
        Self::SCHEDULE_AT_COLUMN
    }

    /// Column name qualified by the entity table, for joined queries.
    fn qualified_schedule_at_column() -> String
    where
        Self: Sized,
    {
        qualify_column(Self::TABLE, Self::SCHEDULE_AT_COLUMN)
    }

    /// Assigns from free-form input. Malformed input clears the attribute.
    fn set_schedule_at_input(&mut self, input: Option<&str>) {
        self.set_schedule_at(normalize_schedule_input(input));
    }

    /// Sets the visibility instant in memory only.
    fn schedule_without_saving(&mut self, at: impl Into<ScheduleAt>) -> &mut Self
    where
        Self: Sized,
    {
        self.set_schedule_at(Some(at.into()));
        self
    }

    /// Clears the visibility instant in memory only.
    fn unschedule_without_saving(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.set_schedule_at(None);
        self
    }

    fn schedule_state<C: Clock + ?Sized>(&self, clock: &C) -> ScheduleState
    where
        Self: Sized,
    {
        ScheduleState::of(self.schedule_at(), clock.now())
    }

    /// True when the instant lies strictly after now.
    fn is_scheduled_in_future<C: Clock + ?Sized>(&self, clock: &C) -> bool
    where
        Self: Sized,
    {
        let now = clock.now();
        self.schedule_at().is_some_and(|at| at > now)
    }

    /// True when the instant lies strictly before now.
    fn was_scheduled_in_past<C: Clock + ?Sized>(&self, clock: &C) -> bool
    where
        Self: Sized,
    {
        let now = clock.now();
        self.schedule_at().is_some_and(|at| at < now)
    }
}
