//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the row mapping contract for schedulable entities.
//! - Provide one generic SQLite repository that applies visibility scopes.
//!
//! # Invariants
//! - Every read is built by `EntityQuery`, so the default scope cannot be
//!   skipped by accident.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod entity;
pub mod post_repo;
pub mod schedule_repo;
