//! Typed lifecycle notifications around schedule/unschedule.
//!
//! # Invariants
//! - Before-hooks run in registration order; the first `Veto` stops the
//!   remaining before-hooks and the operation.
//! - After-hooks cannot veto and all of them run.

use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Lifecycle notification names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Scheduling,
    Scheduled,
    Unscheduling,
    Unscheduled,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduling => "scheduling",
            Self::Scheduled => "scheduled",
            Self::Unscheduling => "unscheduling",
            Self::Unscheduled => "unscheduled",
        }
    }

    /// Whether handlers of this event may veto the operation.
    pub fn is_cancelable(self) -> bool {
        matches!(self, Self::Scheduling | Self::Unscheduling)
    }
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer of a before-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    Proceed,
    Veto,
}

impl HookDecision {
    pub fn is_veto(self) -> bool {
        self == Self::Veto
    }
}

/// Observer with one method per lifecycle event. All methods default to
/// "allow, do nothing".
pub trait ScheduleObserver<E> {
    fn scheduling(&self, _entity: &E) -> HookDecision {
        HookDecision::Proceed
    }

    fn scheduled(&self, _entity: &E) {}

    fn unscheduling(&self, _entity: &E) -> HookDecision {
        HookDecision::Proceed
    }

    fn unscheduled(&self, _entity: &E) {}
}

type BeforeHook<E> = Box<dyn Fn(&E) -> HookDecision>;
type AfterHook<E> = Box<dyn Fn(&E)>;

/// Per-entity-type hook registry.
pub struct LifecycleHooks<E> {
    scheduling: Vec<BeforeHook<E>>,
    scheduled: Vec<AfterHook<E>>,
    unscheduling: Vec<BeforeHook<E>>,
    unscheduled: Vec<AfterHook<E>>,
}

impl<E> Default for LifecycleHooks<E> {
    fn default() -> Self {
        Self {
            scheduling: Vec::new(),
            scheduled: Vec::new(),
            unscheduling: Vec::new(),
            unscheduled: Vec::new(),
        }
    }
}

impl<E: 'static> LifecycleHooks<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scheduling(&mut self, hook: impl Fn(&E) -> HookDecision + 'static) -> &mut Self {
        self.scheduling.push(Box::new(hook));
        self
    }

    pub fn on_scheduled(&mut self, hook: impl Fn(&E) + 'static) -> &mut Self {
        self.scheduled.push(Box::new(hook));
        self
    }

    pub fn on_unscheduling(&mut self, hook: impl Fn(&E) -> HookDecision + 'static) -> &mut Self {
        self.unscheduling.push(Box::new(hook));
        self
    }

    pub fn on_unscheduled(&mut self, hook: impl Fn(&E) + 'static) -> &mut Self {
        self.unscheduled.push(Box::new(hook));
        self
    }

    /// Subscribes every method of `observer`.
    pub fn observe(&mut self, observer: impl ScheduleObserver<E> + 'static) -> &mut Self {
        let observer: Rc<dyn ScheduleObserver<E>> = Rc::new(observer);

        let handle = Rc::clone(&observer);
        self.on_scheduling(move |entity| handle.scheduling(entity));
        let handle = Rc::clone(&observer);
        self.on_scheduled(move |entity| handle.scheduled(entity));
        let handle = Rc::clone(&observer);
        self.on_unscheduling(move |entity| handle.unscheduling(entity));
        self.on_unscheduled(move |entity| observer.unscheduled(entity));
        self
    }
}

impl<E> LifecycleHooks<E> {
    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        match event {
            LifecycleEvent::Scheduling => self.scheduling.len(),
            LifecycleEvent::Scheduled => self.scheduled.len(),
            LifecycleEvent::Unscheduling => self.unscheduling.len(),
            LifecycleEvent::Unscheduled => self.unscheduled.len(),
        }
    }

    /// Runs before-hooks for `event`. Non-cancelable events always proceed.
    pub fn run_before(&self, event: LifecycleEvent, entity: &E) -> HookDecision {
        let hooks = match event {
            LifecycleEvent::Scheduling => &self.scheduling,
            LifecycleEvent::Unscheduling => &self.unscheduling,
            LifecycleEvent::Scheduled | LifecycleEvent::Unscheduled => {
                return HookDecision::Proceed
            }
        };

        for hook in hooks {
            if hook(entity).is_veto() {
                return HookDecision::Veto;
            }
        }
        HookDecision::Proceed
    }

    /// Runs after-hooks for `event`. Cancelable events have none.
    pub fn run_after(&self, event: LifecycleEvent, entity: &E) {
        let hooks = match event {
            LifecycleEvent::Scheduled => &self.scheduled,
            LifecycleEvent::Unscheduled => &self.unscheduled,
            LifecycleEvent::Scheduling | LifecycleEvent::Unscheduling => return,
        };

        for hook in hooks {
            hook(entity);
        }
    }
}
