use rusqlite::{params, Connection};

use crate::db::models::LikeToggle;

/// Flip the like state of `user_id` on `post_id`.
///
/// Delete first; only when nothing was deleted insert a new row. The
/// `UNIQUE(user_id, post_id)` constraint turns a concurrent double insert into
/// a no-op, so a pair never holds more than one like.
pub fn toggle_like(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
) -> rusqlite::Result<LikeToggle> {
    let removed = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
    )?;
    if removed > 0 {
        return Ok(LikeToggle::Unliked);
    }

    conn.execute(
        "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)
         ON CONFLICT(user_id, post_id) DO NOTHING",
        params![user_id, post_id],
    )?;
    Ok(LikeToggle::Liked)
}

pub fn has_liked(conn: &Connection, user_id: i64, post_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM likes WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
        |r| r.get(0),
    )
}

pub fn count_likes(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        params![post_id],
        |r| r.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_post, insert_user, migrated_pool};

    #[test]
    fn toggle_twice_returns_to_zero() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        let ana = insert_user(&conn, "ana");
        let post = insert_post(&conn, ana, "2025-01-01 00:00:00.000");

        assert_eq!(toggle_like(&conn, ana, post).unwrap(), LikeToggle::Liked);
        assert_eq!(count_likes(&conn, post).unwrap(), 1);
        assert!(has_liked(&conn, ana, post).unwrap());

        assert_eq!(toggle_like(&conn, ana, post).unwrap(), LikeToggle::Unliked);
        assert_eq!(count_likes(&conn, post).unwrap(), 0);
        assert!(!has_liked(&conn, ana, post).unwrap());
    }

    #[test]
    fn likes_are_per_user() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        let ana = insert_user(&conn, "ana");
        let bob = insert_user(&conn, "bob");
        let post = insert_post(&conn, ana, "2025-01-01 00:00:00.000");

        toggle_like(&conn, ana, post).unwrap();
        toggle_like(&conn, bob, post).unwrap();
        assert_eq!(count_likes(&conn, post).unwrap(), 2);

        toggle_like(&conn, bob, post).unwrap();
        assert_eq!(count_likes(&conn, post).unwrap(), 1);
        assert!(has_liked(&conn, ana, post).unwrap());
        assert!(!has_liked(&conn, bob, post).unwrap());
    }

    #[test]
    fn like_on_missing_post_fails() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        let ana = insert_user(&conn, "ana");
        assert!(toggle_like(&conn, ana, 404).is_err());
    }
}
