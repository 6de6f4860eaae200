//! Schedulable entity use-case service.
//!
//! # Responsibility
//! - Bundle a repository, a clock, and lifecycle hooks for one entity type.
//! - Read "now" once per call and pass it down to every predicate.
//!
//! # Invariants
//! - Service APIs never bypass repository scope handling.
//! - Service layer remains storage-agnostic.

use crate::clock::Clock;
use crate::lifecycle::{self, LifecycleHooks, ScheduleOutcome};
use crate::model::schedule_at::{ScheduleAt, ScheduleState};
use crate::query::{EntityQuery, ScheduleScope};
use crate::repo::schedule_repo::{RepoResult, ScheduleRepository};
use crate::schedulable::HasVisibilitySchedule;
use uuid::Uuid;

/// Use-case service for one schedulable entity type.
pub struct ScheduleService<E, R, C> {
    repo: R,
    clock: C,
    hooks: LifecycleHooks<E>,
}

impl<E, R, C> ScheduleService<E, R, C>
where
    E: HasVisibilitySchedule + 'static,
    R: ScheduleRepository<E>,
    C: Clock,
{
    /// Creates a service with no lifecycle hooks registered.
    pub fn new(repo: R, clock: C) -> Self {
        Self::with_hooks(repo, clock, LifecycleHooks::new())
    }

    pub fn with_hooks(repo: R, clock: C, hooks: LifecycleHooks<E>) -> Self {
        Self { repo, clock, hooks }
    }

    /// Registration point for lifecycle observers.
    pub fn hooks_mut(&mut self) -> &mut LifecycleHooks<E> {
        &mut self.hooks
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persists the entity as-is, without lifecycle notifications.
    pub fn save(&self, entity: &E) -> RepoResult<()> {
        self.repo.save(entity)
    }

    /// Finds one record by id; pending records are hidden.
    pub fn find(&self, id: Uuid) -> RepoResult<Option<E>> {
        self.repo.find(id, self.clock.now())
    }

    pub fn find_with_scope(&self, id: Uuid, scope: ScheduleScope) -> RepoResult<Option<E>> {
        self.repo.find_with_scope(id, scope, self.clock.now())
    }

    pub fn list(&self, query: &EntityQuery<E>) -> RepoResult<Vec<E>> {
        self.repo.list(query, self.clock.now())
    }

    pub fn count(&self, query: &EntityQuery<E>) -> RepoResult<u64> {
        self.repo.count(query, self.clock.now())
    }

    /// Schedules through the lifecycle: hooks, mutation, save.
    pub fn schedule(
        &self,
        entity: &mut E,
        at: impl Into<ScheduleAt>,
    ) -> RepoResult<ScheduleOutcome> {
        lifecycle::schedule(entity, at, &self.repo, &self.hooks)
    }

    /// Unschedules through the lifecycle: hooks, mutation, save.
    pub fn unschedule(&self, entity: &mut E) -> RepoResult<ScheduleOutcome> {
        lifecycle::unschedule(entity, &self.repo, &self.hooks)
    }

    pub fn state_of(&self, entity: &E) -> ScheduleState {
        entity.schedule_state(&self.clock)
    }

    pub fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.repo.delete(id)
    }
}
