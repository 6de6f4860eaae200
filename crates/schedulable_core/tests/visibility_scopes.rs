use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use schedulable_core::db::open_db_in_memory;
use schedulable_core::{
    EntityQuery, EntityStore, FrozenClock, HasVisibilitySchedule, Post, ScheduleAt,
    ScheduleRepository, ScheduleScope, ScheduleService, ScheduleState, SqlitePostRepository,
};
use std::collections::HashSet;
use uuid::Uuid;

fn frozen_now() -> ScheduleAt {
    ScheduleAt::parse("2026-10-19 12:00:00").unwrap()
}

struct Fixture {
    unscheduled: Post,
    past: Post,
    at_now: Post,
    future: Post,
}

fn seed(conn: &Connection) -> Fixture {
    let repo = SqlitePostRepository::try_new(conn).unwrap();
    let now = frozen_now();

    let unscheduled = Post::new("unscheduled");
    let mut past = Post::new("past");
    past.schedule_at = Some(now.shift(Duration::days(-3)));
    let mut at_now = Post::new("at now");
    at_now.schedule_at = Some(now);
    let mut future = Post::new("future");
    future.schedule_at = Some(now.shift(Duration::seconds(1)));

    for post in [&unscheduled, &past, &at_now, &future] {
        repo.save(post).unwrap();
    }

    Fixture {
        unscheduled,
        past,
        at_now,
        future,
    }
}

fn ids(posts: Vec<Post>) -> HashSet<Uuid> {
    posts.into_iter().map(|post| post.id).collect()
}

#[test]
fn default_scope_hides_only_future_records() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let visible = ids(repo.list(&EntityQuery::new(), frozen_now()).unwrap());

    assert_eq!(
        visible,
        HashSet::from([fixture.unscheduled.id, fixture.past.id, fixture.at_now.id])
    );
    assert!(!visible.contains(&fixture.future.id));
}

#[test]
fn only_scheduled_returns_strictly_future_records() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let pending = ids(
        repo.list(&EntityQuery::new().only_scheduled(), frozen_now())
            .unwrap(),
    );

    assert_eq!(pending, HashSet::from([fixture.future.id]));
}

#[test]
fn with_scheduled_returns_the_full_table() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let query = EntityQuery::new().with_scheduled();
    let all = ids(repo.list(&query, frozen_now()).unwrap());

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(all.len() as i64, total);
    assert_eq!(
        all,
        HashSet::from([
            fixture.unscheduled.id,
            fixture.past.id,
            fixture.at_now.id,
            fixture.future.id,
        ])
    );
    assert_eq!(repo.count(&query, frozen_now()).unwrap(), 4);
}

#[test]
fn with_scheduled_still_honours_caller_filters() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let query = EntityQuery::new()
        .with_scheduled()
        .filter_eq("title", "future".to_string());
    let found = repo.list(&query, frozen_now()).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, fixture.future.id);
}

#[test]
fn boundary_instant_equal_to_now_is_visible() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let now = frozen_now();

    assert!(repo.find(fixture.at_now.id, now).unwrap().is_some());
    assert!(repo
        .find_with_scope(fixture.at_now.id, ScheduleScope::OnlyScheduled, now)
        .unwrap()
        .is_none());

    // One second earlier the same record is still pending.
    let earlier = now.shift(Duration::seconds(-1));
    assert!(repo.find(fixture.at_now.id, earlier).unwrap().is_none());
}

#[test]
fn identity_lookup_respects_default_scope() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let now = frozen_now();

    assert!(repo.find(fixture.future.id, now).unwrap().is_none());
    let loaded = repo
        .find_with_scope(fixture.future.id, ScheduleScope::WithScheduled, now)
        .unwrap()
        .unwrap();
    assert_eq!(loaded, fixture.future);
}

#[test]
fn records_become_visible_when_clock_passes_their_instant() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let clock = FrozenClock::new(frozen_now());
    let service: ScheduleService<Post, _, _> =
        ScheduleService::new(SqlitePostRepository::try_new(&conn).unwrap(), &clock);

    assert!(service.find(fixture.future.id).unwrap().is_none());
    assert_eq!(service.count(&EntityQuery::new().only_scheduled()).unwrap(), 1);

    clock.advance(Duration::seconds(1));

    assert!(service.find(fixture.future.id).unwrap().is_some());
    assert_eq!(service.count(&EntityQuery::new().only_scheduled()).unwrap(), 0);
    assert_eq!(service.count(&EntityQuery::new()).unwrap(), 4);
}

#[test]
fn pagination_applies_after_scope() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let page = repo
        .list(&EntityQuery::new().limit(2).offset(1), frozen_now())
        .unwrap();

    // Insertion order: unscheduled, past, at_now (future is filtered out).
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, fixture.past.id);
    assert_eq!(page[1].id, fixture.at_now.id);
}

#[test]
fn latest_storable_instant_stays_pending_and_beyond_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let now = frozen_now();

    assert_eq!(ScheduleAt::parse("253402300800"), None);
    assert!("253402300800".parse::<ScheduleAt>().is_err());

    let mut far = Post::new("far");
    far.set_schedule_at_input(Some("253402300800"));
    assert_eq!(far.schedule_at, None);

    let beyond = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
    far.schedule_without_saving(beyond);
    let stored = far.schedule_at.unwrap();
    assert_eq!(stored.to_string(), "9999-12-31 23:59:59");
    assert_eq!(stored.state_at(now), ScheduleState::Pending);
    repo.save(&far).unwrap();

    assert!(repo.list(&EntityQuery::new(), now).unwrap().is_empty());
    let pending = ids(
        repo.list(&EntityQuery::new().only_scheduled(), now)
            .unwrap(),
    );
    assert_eq!(pending, HashSet::from([far.id]));
}
