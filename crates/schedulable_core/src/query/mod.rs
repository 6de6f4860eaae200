//! Query construction for schedulable entities.
//!
//! # Responsibility
//! - Build read queries for one entity type with the default visibility
//!   scope attached at construction.
//! - Expose the two override modes as explicit builder calls.
//! - Render parameterized SQL with table-qualified columns.
//!
//! # Invariants
//! - A fresh `EntityQuery` always carries `ScheduleScope::Default`.
//! - Caller predicates combine with the visibility predicate using `AND`.
//! - `now` is bound once per render; every placeholder sees the same value.

pub mod scope;

use crate::db::schema::ensure_identifier;
use crate::db::DbResult;
use crate::model::schedule_at::ScheduleAt;
use crate::repo::entity::SqlEntity;
use crate::schedulable::qualify_column;
use rusqlite::types::Value;
use std::marker::PhantomData;

pub use scope::ScheduleScope;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(&'static str, Value),
    IsNull(&'static str),
}

/// Read query over one entity type.
#[derive(Debug, Clone)]
pub struct EntityQuery<E> {
    scope: ScheduleScope,
    conditions: Vec<Condition>,
    limit: Option<u32>,
    offset: u32,
    _entity: PhantomData<fn() -> E>,
}

/// SQL text plus positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl<E: SqlEntity> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SqlEntity> EntityQuery<E> {
    /// Starts a query with the default visibility scope.
    pub fn new() -> Self {
        Self {
            scope: ScheduleScope::Default,
            conditions: Vec::new(),
            limit: None,
            offset: 0,
            _entity: PhantomData,
        }
    }

    /// Matches one record by id, still subject to the scope.
    pub fn by_id(id: uuid::Uuid) -> Self {
        Self::new().filter_eq(E::ID_COLUMN, id.to_string())
    }

    /// Replaces the default scope with "future instants only".
    pub fn only_scheduled(self) -> Self {
        self.with_scope(ScheduleScope::OnlyScheduled)
    }

    /// Replaces the default scope with "every record".
    ///
    /// Only the visibility predicate is dropped; caller filters still narrow
    /// the result.
    pub fn with_scheduled(self) -> Self {
        self.with_scope(ScheduleScope::WithScheduled)
    }

    pub fn with_scope(mut self, scope: ScheduleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn filter_eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    pub fn filter_null(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::IsNull(column));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn scope(&self) -> ScheduleScope {
        self.scope
    }

    /// Renders `SELECT <columns> FROM <table> WHERE ...` for `now`.
    pub fn to_select_sql(&self, now: ScheduleAt) -> DbResult<RenderedQuery> {
        let mut sql = format!("SELECT {} FROM {}", select_list::<E>()?, E::TABLE);
        let params = self.push_where(&mut sql, now)?;
        let mut rendered = RenderedQuery { sql, params };

        rendered.sql.push_str(&format!(
            " ORDER BY {}",
            qualify_column(E::TABLE, "rowid")
        ));
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                rendered.sql.push_str(" LIMIT ?");
                rendered.params.push(Value::Integer(i64::from(limit)));
                if offset > 0 {
                    rendered.sql.push_str(" OFFSET ?");
                    rendered.params.push(Value::Integer(i64::from(offset)));
                }
            }
            (None, offset) if offset > 0 => {
                rendered.sql.push_str(" LIMIT -1 OFFSET ?");
                rendered.params.push(Value::Integer(i64::from(offset)));
            }
            (None, _) => {}
        }

        Ok(rendered)
    }

    /// Renders `SELECT COUNT(*) FROM <table> WHERE ...` for `now`.
    ///
    /// Limit and offset are ignored.
    pub fn to_count_sql(&self, now: ScheduleAt) -> DbResult<RenderedQuery> {
        ensure_identifier(E::TABLE)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let params = self.push_where(&mut sql, now)?;
        Ok(RenderedQuery { sql, params })
    }

    fn push_where(&self, sql: &mut String, now: ScheduleAt) -> DbResult<Vec<Value>> {
        ensure_identifier(E::SCHEDULE_AT_COLUMN)?;
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(predicate) = self.scope.predicate(&E::qualified_schedule_at_column()) {
            clauses.push(predicate);
            params.push(Value::Text(now.to_string()));
        }

        for condition in &self.conditions {
            match condition {
                Condition::Eq(column, value) => {
                    ensure_identifier(column)?;
                    clauses.push(format!("{} = ?", qualify_column(E::TABLE, column)));
                    params.push(value.clone());
                }
                Condition::IsNull(column) => {
                    ensure_identifier(column)?;
                    clauses.push(format!("{} IS NULL", qualify_column(E::TABLE, column)));
                }
            }
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        Ok(params)
    }
}

/// `<table>.<col> AS <col>` for id, data, and visibility columns.
pub(crate) fn select_list<E: SqlEntity>() -> DbResult<String> {
    ensure_identifier(E::TABLE)?;
    let mut columns = vec![E::ID_COLUMN];
    columns.extend_from_slice(E::DATA_COLUMNS);
    columns.push(E::SCHEDULE_AT_COLUMN);

    let mut parts = Vec::with_capacity(columns.len());
    for column in columns {
        ensure_identifier(column)?;
        parts.push(format!("{} AS {column}", qualify_column(E::TABLE, column)));
    }
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::EntityQuery;
    use crate::model::post::Post;
    use crate::model::schedule_at::ScheduleAt;
    use crate::query::ScheduleScope;
    use rusqlite::types::Value;

    fn now() -> ScheduleAt {
        ScheduleAt::parse("2026-06-15 09:30:00").unwrap()
    }

    #[test]
    fn new_query_carries_default_scope() {
        let query = EntityQuery::<Post>::new();
        assert_eq!(query.scope(), ScheduleScope::Default);

        let rendered = query.to_select_sql(now()).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT posts.id AS id, posts.title AS title, posts.schedule_at AS schedule_at \
             FROM posts \
             WHERE (posts.schedule_at IS NULL OR posts.schedule_at <= ?) \
             ORDER BY posts.rowid"
        );
        assert_eq!(
            rendered.params,
            vec![Value::Text("2026-06-15 09:30:00".to_string())]
        );
    }

    #[test]
    fn only_scheduled_replaces_default_predicate() {
        let rendered = EntityQuery::<Post>::new()
            .only_scheduled()
            .to_count_sql(now())
            .unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT COUNT(*) FROM posts \
             WHERE (posts.schedule_at IS NOT NULL AND posts.schedule_at > ?)"
        );
        assert!(!rendered.sql.contains("IS NULL OR"));
    }

    #[test]
    fn with_scheduled_and_no_filters_renders_no_where_clause() {
        let rendered = EntityQuery::<Post>::new()
            .with_scheduled()
            .to_count_sql(now())
            .unwrap();
        assert_eq!(rendered.sql, "SELECT COUNT(*) FROM posts");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn caller_filters_combine_with_scope_and_pagination() {
        let rendered = EntityQuery::<Post>::new()
            .filter_eq("title", "A".to_string())
            .limit(5)
            .offset(2)
            .to_select_sql(now())
            .unwrap();
        assert!(rendered.sql.ends_with(
            "WHERE (posts.schedule_at IS NULL OR posts.schedule_at <= ?) \
             AND posts.title = ? ORDER BY posts.rowid LIMIT ? OFFSET ?"
        ));
        assert_eq!(rendered.params.len(), 4);
        assert_eq!(rendered.params[1], Value::Text("A".to_string()));
    }

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let rendered = EntityQuery::<Post>::new()
            .with_scheduled()
            .offset(3)
            .to_select_sql(now())
            .unwrap();
        assert!(rendered.sql.ends_with("ORDER BY posts.rowid LIMIT -1 OFFSET ?"));
        assert_eq!(rendered.params, vec![Value::Integer(3)]);
    }

    #[test]
    fn rejects_unsafe_filter_column() {
        let result = EntityQuery::<Post>::new()
            .filter_null("title; --")
            .to_select_sql(now());
        assert!(result.is_err());
    }
}
