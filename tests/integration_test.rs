use miniinsta::auth::{accounts, session};
use miniinsta::db::{self, comments, likes, posts, users};
use miniinsta::error::AppError;
use tempfile::TempDir;

fn setup() -> (TempDir, miniinsta::state::DbPool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&db_pool).expect("Failed to run migrations");
    (temp_dir, db_pool)
}

#[test]
fn migrations_are_idempotent_on_reopen() {
    let (temp_dir, pool) = setup();
    {
        let conn = pool.get().unwrap();
        accounts::register(&conn, "ana", "pw1", 4).unwrap();
    }
    drop(pool);

    let pool = db::create_pool(&temp_dir.path().join("test.db")).unwrap();
    db::run_migrations(&pool).expect("Re-running migrations should be a no-op");

    let conn = pool.get().unwrap();
    assert_eq!(users::count_users(&conn).unwrap(), 1);
}

#[test]
fn registration_conflict_leaves_exactly_one_row() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    accounts::register(&conn, "ana", "pw1", 4).unwrap();
    let err = accounts::register(&conn, " ana ", "pw2", 4).unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(users::count_users(&conn).unwrap(), 1);
    assert!(accounts::authenticate(&conn, "ana", "pw1").is_ok());
    assert!(matches!(
        accounts::authenticate(&conn, "ana", "pw2"),
        Err(AppError::Unauthorized)
    ));
}

#[test]
fn password_is_never_stored_in_plain_text() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    accounts::register(&conn, "ana", "secret-pw", 4).unwrap();
    let user = users::find_by_username(&conn, "ana").unwrap().unwrap();

    assert_ne!(user.password_hash, "secret-pw");
    assert!(user.password_hash.starts_with("$2"));
}

#[test]
fn like_toggle_parity_determines_state() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let ana = accounts::register(&conn, "ana", "pw1", 4).unwrap();
    let bo = accounts::register(&conn, "bo", "pw2", 4).unwrap();
    let post = posts::insert_post(&conn, ana, "1_1_x.png", Some("hola")).unwrap();

    for _ in 0..3 {
        likes::toggle_like(&conn, ana, post).unwrap();
    }
    likes::toggle_like(&conn, bo, post).unwrap();
    likes::toggle_like(&conn, bo, post).unwrap();

    assert!(likes::has_liked(&conn, ana, post).unwrap());
    assert!(!likes::has_liked(&conn, bo, post).unwrap());
    assert_eq!(likes::count_likes(&conn, post).unwrap(), 1);

    let summary = posts::list_feed(&conn).unwrap().remove(0);
    assert_eq!(summary.like_count, 1);
}

#[test]
fn deleting_a_post_removes_its_comments_and_likes() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let ana = accounts::register(&conn, "ana", "pw1", 4).unwrap();
    let post = posts::insert_post(&conn, ana, "1_1_x.png", None).unwrap();
    comments::insert_comment(&conn, ana, post, "nice").unwrap();
    likes::toggle_like(&conn, ana, post).unwrap();

    assert!(posts::delete_post(&conn, post).unwrap());

    assert_eq!(comments::count_comments(&conn, post).unwrap(), 0);
    assert_eq!(likes::count_likes(&conn, post).unwrap(), 0);
    assert!(posts::get_post(&conn, post).unwrap().is_none());
}

#[test]
fn feed_and_profile_agree_on_ordering() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let ana = accounts::register(&conn, "ana", "pw1", 4).unwrap();
    let bo = accounts::register(&conn, "bo", "pw2", 4).unwrap();
    let first = posts::insert_post(&conn, ana, "a.png", None).unwrap();
    let second = posts::insert_post(&conn, bo, "b.png", None).unwrap();
    let third = posts::insert_post(&conn, ana, "c.png", None).unwrap();

    let feed: Vec<i64> = posts::list_feed(&conn)
        .unwrap()
        .into_iter()
        .map(|s| s.post.id)
        .collect();
    assert_eq!(feed, vec![third, second, first]);

    let profile: Vec<i64> = posts::list_by_user(&conn, ana)
        .unwrap()
        .into_iter()
        .map(|s| s.post.id)
        .collect();
    assert_eq!(profile, vec![third, first]);
}

#[test]
fn expired_sessions_are_purged() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let ana = accounts::register(&conn, "ana", "pw1", 4).unwrap();
    session::create_session(&conn, ana, 1).unwrap();
    let stale = session::create_session(&conn, ana, 1).unwrap();
    conn.execute(
        "UPDATE sessions SET expires_at = datetime('now', '-1 hour') WHERE token = ?1",
        [&stale],
    )
    .unwrap();

    assert_eq!(session::purge_expired(&conn).unwrap(), 1);
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 1);
}
