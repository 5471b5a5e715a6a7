use rusqlite::{params, Connection};

use crate::db::models::{Comment, CommentWithAuthor};

pub fn insert_comment(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    text: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (text, user_id, post_id) VALUES (?1, ?2, ?3)",
        params![text, user_id, post_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Comments on a post, oldest first.
pub fn list_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<CommentWithAuthor>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.created_at, c.user_id, c.post_id, u.username
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentWithAuthor {
                comment: Comment {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    created_at: row.get(2)?,
                    user_id: row.get(3)?,
                    post_id: row.get(4)?,
                },
                username: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(comments)
}

pub fn count_comments(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
        params![post_id],
        |r| r.get(0),
    )
}
