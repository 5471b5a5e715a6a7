use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Post, PostSummary, User};

// Aggregates are selected explicitly; nothing is loaded lazily.
const SUMMARY_SELECT: &str = "SELECT p.id, p.image_filename, p.caption, p.created_at, p.user_id,
        u.username,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
     FROM posts p
     JOIN users u ON u.id = p.user_id";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<PostSummary> {
    Ok(PostSummary {
        post: Post {
            id: row.get(0)?,
            image_filename: row.get(1)?,
            caption: row.get(2)?,
            created_at: row.get(3)?,
            user_id: row.get(4)?,
        },
        username: row.get(5)?,
        like_count: row.get(6)?,
        comment_count: row.get(7)?,
    })
}

/// Insert a post owned by `user_id` and return its id.
pub fn insert_post(
    conn: &Connection,
    user_id: i64,
    image_filename: &str,
    caption: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (image_filename, caption, user_id) VALUES (?1, ?2, ?3)",
        params![image_filename, caption, user_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        "SELECT id, image_filename, caption, created_at, user_id FROM posts WHERE id = ?1",
        params![post_id],
        |row| {
            Ok(Post {
                id: row.get(0)?,
                image_filename: row.get(1)?,
                caption: row.get(2)?,
                created_at: row.get(3)?,
                user_id: row.get(4)?,
            })
        },
    )
    .optional()
}

/// The user who owns a post.
pub fn get_owner(conn: &Connection, post_id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT u.id, u.username, u.password_hash, u.joined_at
         FROM posts p JOIN users u ON u.id = p.user_id
         WHERE p.id = ?1",
        params![post_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                joined_at: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn post_exists(conn: &Connection, post_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |r| r.get(0),
    )
}

/// Every post, newest first.
pub fn list_feed(conn: &Connection) -> rusqlite::Result<Vec<PostSummary>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY p.created_at DESC, p.id DESC",
        SUMMARY_SELECT
    ))?;
    let posts = stmt
        .query_map([], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// A single user's posts, newest first.
pub fn list_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<PostSummary>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
        SUMMARY_SELECT
    ))?;
    let posts = stmt
        .query_map(params![user_id], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Delete a post; its comments and likes go with it via `ON DELETE CASCADE`.
/// Returns whether a row was removed.
pub fn delete_post(conn: &Connection, post_id: i64) -> rusqlite::Result<bool> {
    let removed = conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
    Ok(removed > 0)
}
