use rusqlite::Connection;
use schedulable_core::db::migrations::latest_version;
use schedulable_core::db::open_db_in_memory;
use schedulable_core::{
    EntityQuery, EntityStore, Post, RepoError, ScheduleAt, ScheduleRepository, ScheduleScope,
    SqlitePostRepository,
};
use uuid::Uuid;

fn now() -> ScheduleAt {
    ScheduleAt::parse("2026-10-19 12:00:00").unwrap()
}

fn expect_guard_error(conn: &Connection) -> RepoError {
    match SqlitePostRepository::try_new(conn) {
        Ok(_) => panic!("repository accepted an unprepared connection"),
        Err(err) => err,
    }
}

#[test]
fn rejects_connection_without_migrations() {
    let conn = Connection::open_in_memory().unwrap();

    let err = expect_guard_error(&conn);
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        } if expected_version == latest_version()
    ));
}

#[test]
fn rejects_connection_missing_posts_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE posts;").unwrap();

    let err = expect_guard_error(&conn);
    assert!(matches!(err, RepoError::MissingRequiredTable("posts")));
}

#[test]
fn rejects_table_missing_visibility_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE posts (id TEXT PRIMARY KEY NOT NULL, title TEXT, updated_at INTEGER);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    let err = expect_guard_error(&conn);
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "posts",
            column: "schedule_at",
        }
    ));
}

#[test]
fn malformed_persisted_instant_is_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let post = Post::new("corrupted");
    repo.save(&post).unwrap();
    conn.execute(
        "UPDATE posts SET schedule_at = 'whenever' WHERE id = ?1;",
        [post.id.to_string()],
    )
    .unwrap();

    let err = repo
        .list(&EntityQuery::new().with_scheduled(), now())
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("whenever")));
}

#[test]
fn malformed_persisted_id_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO posts (id, title) VALUES ('not-a-uuid', 'x');", [])
        .unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo.list(&EntityQuery::new(), now()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("not-a-uuid")));
}

#[test]
fn delete_removes_pending_records_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let mut post = Post::new("pending");
    post.schedule_at = Some(now().shift(chrono::Duration::days(1)));
    repo.save(&post).unwrap();

    repo.delete(post.id).unwrap();
    assert!(repo
        .find_with_scope(post.id, ScheduleScope::WithScheduled, now())
        .unwrap()
        .is_none());

    let missing = Uuid::new_v4();
    assert!(matches!(
        repo.delete(missing),
        Err(RepoError::NotFound(id)) if id == missing
    ));
}

#[test]
fn save_updates_existing_row_in_place() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let mut post = Post::new("first");
    repo.save(&post).unwrap();

    post.title = Some("second".to_string());
    post.schedule_at = Some(now());
    repo.save(&post).unwrap();

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(repo.find(post.id, now()).unwrap(), Some(post));
}
