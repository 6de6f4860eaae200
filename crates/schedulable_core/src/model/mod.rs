//! Domain model for schedulable records.
//!
//! # Responsibility
//! - Define the visibility instant value type and derived state.
//! - Define the reference `Post` entity.
//!
//! # Invariants
//! - Every entity is identified by a stable `Uuid`.
//! - Visibility is never stored as a flag; it is derived from `schedule_at`.

pub mod post;
pub mod schedule_at;
