//! Deferred-visibility records on SQLite.
//! This crate is the single source of truth for scheduling invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod schedulable;
pub mod service;

pub use clock::{Clock, FrozenClock, SystemClock};
pub use config::{ConfigError, SchedulableConfig};
pub use lifecycle::{
    HookDecision, LifecycleEvent, LifecycleHooks, ScheduleObserver, ScheduleOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::post::{Post, PostId};
pub use model::schedule_at::{normalize_schedule_input, ScheduleAt, ScheduleState};
pub use query::{EntityQuery, ScheduleScope};
pub use repo::entity::SqlEntity;
pub use repo::post_repo::SqlitePostRepository;
pub use repo::schedule_repo::{
    EntityStore, RepoError, RepoResult, ScheduleRepository, SqliteScheduleRepository,
};
pub use schedulable::{HasVisibilitySchedule, DEFAULT_SCHEDULE_AT_COLUMN};
pub use service::schedule_service::ScheduleService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
