//! Post row mapping and repository alias.
//!
//! # Invariants
//! - `posts.updated_at` is refreshed on every save.
//! - Titles are stored as nullable text, unchanged.

use crate::model::post::Post;
use crate::model::schedule_at::ScheduleAt;
use crate::repo::entity::SqlEntity;
use crate::repo::schedule_repo::{RepoResult, SqliteScheduleRepository};
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

/// SQLite repository for posts.
pub type SqlitePostRepository<'conn> = SqliteScheduleRepository<'conn, Post>;

impl SqlEntity for Post {
    const DATA_COLUMNS: &'static [&'static str] = &["title"];
    const UPDATED_AT_COLUMN: Option<&'static str> = Some("updated_at");

    fn id(&self) -> Uuid {
        self.id
    }

    fn data_values(&self) -> Vec<Value> {
        vec![match &self.title {
            Some(title) => Value::Text(title.clone()),
            None => Value::Null,
        }]
    }

    fn from_row(id: Uuid, schedule_at: Option<ScheduleAt>, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id,
            title: row.get("title")?,
            schedule_at,
        })
    }
}
