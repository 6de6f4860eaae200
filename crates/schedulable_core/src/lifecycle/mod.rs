//! Schedule/unschedule operations with persistence and notifications.
//!
//! # Responsibility
//! - Apply visibility changes to an entity and persist them.
//! - Fire before/after notifications around the change.
//!
//! # Invariants
//! - Order is before-hooks, mutation, save, after-hooks.
//! - A vetoed operation leaves both the in-memory entity and storage
//!   untouched.
//! - After-hooks run only when the save succeeded.
//! - Save errors propagate unchanged; nothing is retried.

pub mod hooks;

use crate::model::schedule_at::ScheduleAt;
use crate::repo::schedule_repo::{EntityStore, RepoResult};
use crate::schedulable::HasVisibilitySchedule;
use log::{error, info};

pub use hooks::{HookDecision, LifecycleEvent, LifecycleHooks, ScheduleObserver};

/// Result of a lifecycle operation that reached a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ScheduleOutcome {
    /// Hooks allowed the change and it was saved.
    Applied,
    /// A before-hook refused the change; nothing was saved.
    Vetoed,
}

impl ScheduleOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Sets the visibility instant and saves the entity.
pub fn schedule<E, S>(
    entity: &mut E,
    at: impl Into<ScheduleAt>,
    store: &S,
    hooks: &LifecycleHooks<E>,
) -> RepoResult<ScheduleOutcome>
where
    E: HasVisibilitySchedule,
    S: EntityStore<E> + ?Sized,
{
    let at = at.into();
    run(
        entity,
        Some(at),
        store,
        hooks,
        LifecycleEvent::Scheduling,
        LifecycleEvent::Scheduled,
    )
}

/// Clears the visibility instant and saves the entity.
///
/// Calling it on an already unscheduled entity still saves and succeeds.
pub fn unschedule<E, S>(
    entity: &mut E,
    store: &S,
    hooks: &LifecycleHooks<E>,
) -> RepoResult<ScheduleOutcome>
where
    E: HasVisibilitySchedule,
    S: EntityStore<E> + ?Sized,
{
    run(
        entity,
        None,
        store,
        hooks,
        LifecycleEvent::Unscheduling,
        LifecycleEvent::Unscheduled,
    )
}

fn run<E, S>(
    entity: &mut E,
    target: Option<ScheduleAt>,
    store: &S,
    hooks: &LifecycleHooks<E>,
    before: LifecycleEvent,
    after: LifecycleEvent,
) -> RepoResult<ScheduleOutcome>
where
    E: HasVisibilitySchedule,
    S: EntityStore<E> + ?Sized,
{
    if hooks.run_before(before, entity).is_veto() {
        info!(
            "event={} module=lifecycle status=vetoed table={}",
            before,
            E::TABLE
        );
        return Ok(ScheduleOutcome::Vetoed);
    }

    entity.set_schedule_at(target);
    if let Err(err) = store.save(entity) {
        error!(
            "event={} module=lifecycle status=error table={} error={}",
            after,
            E::TABLE,
            err
        );
        return Err(err);
    }

    hooks.run_after(after, entity);
    info!(
        "event={} module=lifecycle status=ok table={} scheduled={}",
        after,
        E::TABLE,
        target.is_some()
    );
    Ok(ScheduleOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::{schedule, unschedule, HookDecision, LifecycleHooks, ScheduleOutcome};
    use crate::model::post::Post;
    use crate::model::schedule_at::ScheduleAt;
    use crate::repo::schedule_repo::{EntityStore, RepoError, RepoResult};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<Vec<Option<ScheduleAt>>>,
        fail: bool,
    }

    impl EntityStore<Post> for MemoryStore {
        fn save(&self, entity: &Post) -> RepoResult<()> {
            if self.fail {
                return Err(RepoError::InvalidData("store offline".to_string()));
            }
            self.saved.borrow_mut().push(entity.schedule_at);
            Ok(())
        }
    }

    fn at() -> ScheduleAt {
        ScheduleAt::parse("2030-01-01 00:00:00").unwrap()
    }

    #[test]
    fn schedule_fires_hooks_around_save() {
        let store = MemoryStore::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = LifecycleHooks::new();

        let log = Rc::clone(&order);
        hooks.on_scheduling(move |post: &Post| {
            log.borrow_mut()
                .push(format!("scheduling:{:?}", post.schedule_at));
            HookDecision::Proceed
        });
        let log = Rc::clone(&order);
        hooks.on_scheduled(move |post: &Post| {
            log.borrow_mut()
                .push(format!("scheduled:{:?}", post.schedule_at.map(|v| v.to_string())));
        });

        let mut post = Post::new("A");
        let outcome = schedule(&mut post, at(), &store, &hooks).unwrap();

        assert_eq!(outcome, ScheduleOutcome::Applied);
        assert_eq!(post.schedule_at, Some(at()));
        assert_eq!(*store.saved.borrow(), vec![Some(at())]);
        assert_eq!(
            *order.borrow(),
            vec![
                "scheduling:None".to_string(),
                "scheduled:Some(\"2030-01-01 00:00:00\")".to_string(),
            ]
        );
    }

    #[test]
    fn veto_leaves_entity_and_store_untouched() {
        let store = MemoryStore::default();
        let mut hooks = LifecycleHooks::new();
        hooks.on_scheduling(|_: &Post| HookDecision::Veto);
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        hooks.on_scheduled(move |_: &Post| *flag.borrow_mut() = true);

        let mut post = Post::new("A");
        let outcome = schedule(&mut post, at(), &store, &hooks).unwrap();

        assert_eq!(outcome, ScheduleOutcome::Vetoed);
        assert!(!outcome.is_applied());
        assert_eq!(post.schedule_at, None);
        assert!(store.saved.borrow().is_empty());
        assert!(!*fired.borrow());
    }

    #[test]
    fn save_failure_propagates_and_skips_after_hooks() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        let mut hooks = LifecycleHooks::new();
        hooks.on_unscheduled(move |_: &Post| *flag.borrow_mut() = true);

        let mut post = Post::new("A");
        let err = unschedule(&mut post, &store, &hooks).unwrap_err();

        assert!(matches!(err, RepoError::InvalidData(message) if message == "store offline"));
        assert!(!*fired.borrow());
    }

    #[test]
    fn unschedule_twice_succeeds_both_times() {
        let store = MemoryStore::default();
        let hooks = LifecycleHooks::new();
        let mut post = Post::new("A");
        post.schedule_at = Some(at());

        assert!(unschedule(&mut post, &store, &hooks).unwrap().is_applied());
        assert!(unschedule(&mut post, &store, &hooks).unwrap().is_applied());
        assert_eq!(post.schedule_at, None);
        assert_eq!(*store.saved.borrow(), vec![None, None]);
    }
}
