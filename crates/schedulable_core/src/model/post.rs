//! Post domain model.
//!
//! # Responsibility
//! - Define the reference entity that adopts the visibility capability.
//!
//! # Invariants
//! - `id` is stable and never reused for another post.
//! - `schedule_at` is the only source of truth for deferred visibility.

use crate::model::schedule_at::ScheduleAt;
use crate::schedulable::HasVisibilitySchedule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;

/// Titled record whose visibility can be deferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: Option<String>,
    /// `None` keeps the post visible in default reads.
    pub schedule_at: Option<ScheduleAt>,
}

impl Post {
    /// Creates an unscheduled post with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), Some(title.into()))
    }

    /// Creates a post with a caller-provided id, for import paths.
    pub fn with_id(id: PostId, title: Option<String>) -> Self {
        Self {
            id,
            title,
            schedule_at: None,
        }
    }
}

impl HasVisibilitySchedule for Post {
    const TABLE: &'static str = "posts";

    fn schedule_at(&self) -> Option<ScheduleAt> {
        self.schedule_at
    }

    fn set_schedule_at(&mut self, value: Option<ScheduleAt>) {
        self.schedule_at = value;
    }
}
