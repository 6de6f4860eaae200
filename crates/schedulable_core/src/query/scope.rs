//! Visibility scopes applied to entity reads.
//!
//! # Invariants
//! - `Default` is `col IS NULL OR col <= now`; equality with now is visible.
//! - `OnlyScheduled` is `col IS NOT NULL AND col > now`; it replaces the
//!   default predicate and is never combined with it.
//! - `WithScheduled` drops the default predicate and adds back the pending
//!   set. The union of the two sets is every row, so it renders no
//!   visibility predicate at all.

use crate::model::schedule_at::{ScheduleAt, ScheduleState};
use serde::{Deserialize, Serialize};

/// Which records a read may return, relative to their visibility instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleScope {
    /// Only records visible now.
    #[default]
    Default,
    /// Only records hidden until a future instant.
    OnlyScheduled,
    /// Every record regardless of visibility.
    WithScheduled,
}

impl ScheduleScope {
    /// SQL predicate over `qualified_column` with one `?` per bound `now`.
    ///
    /// Returns `None` when the scope places no constraint on the column.
    pub fn predicate(self, qualified_column: &str) -> Option<String> {
        match self {
            Self::Default => Some(format!(
                "({qualified_column} IS NULL OR {qualified_column} <= ?)"
            )),
            Self::OnlyScheduled => Some(format!(
                "({qualified_column} IS NOT NULL AND {qualified_column} > ?)"
            )),
            Self::WithScheduled => None,
        }
    }

    /// In-memory counterpart of `predicate`.
    pub fn matches(self, schedule_at: Option<ScheduleAt>, now: ScheduleAt) -> bool {
        let state = ScheduleState::of(schedule_at, now);
        match self {
            Self::Default => state.is_visible(),
            Self::OnlyScheduled => state == ScheduleState::Pending,
            Self::WithScheduled => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::OnlyScheduled => "only_scheduled",
            Self::WithScheduled => "with_scheduled",
        }
    }
}
