//! Plain view structs handed to templates.

use chrono::NaiveDateTime;

use crate::db::models::{CommentWithAuthor, PostSummary};
use crate::db::TIMESTAMP_FORMAT;
use crate::extractors::{CurrentUser, MaybeUser};

/// The signed-in user as shown in the navigation bar.
pub struct Viewer {
    pub username: String,
    pub profile_path: String,
}

impl From<&CurrentUser> for Viewer {
    fn from(user: &CurrentUser) -> Self {
        Self {
            username: user.username.clone(),
            profile_path: profile_path(&user.username),
        }
    }
}

impl Viewer {
    pub fn of(user: &MaybeUser) -> Option<Self> {
        user.0.as_ref().map(Viewer::from)
    }
}

pub struct PostCard {
    pub id: i64,
    pub username: String,
    pub profile_path: String,
    pub image_filename: String,
    pub caption: Option<String>,
    pub created_at: String,
    pub like_count: i64,
    pub comment_count: i64,
}

impl From<PostSummary> for PostCard {
    fn from(summary: PostSummary) -> Self {
        Self {
            id: summary.post.id,
            profile_path: profile_path(&summary.username),
            username: summary.username,
            image_filename: summary.post.image_filename,
            caption: summary.post.caption,
            created_at: format_timestamp(&summary.post.created_at),
            like_count: summary.like_count,
            comment_count: summary.comment_count,
        }
    }
}

pub struct CommentView {
    pub username: String,
    pub profile_path: String,
    pub text: String,
    pub created_at: String,
}

impl From<CommentWithAuthor> for CommentView {
    fn from(c: CommentWithAuthor) -> Self {
        Self {
            profile_path: profile_path(&c.username),
            username: c.username,
            text: c.comment.text,
            created_at: format_timestamp(&c.comment.created_at),
        }
    }
}

/// `/u/<username>` with the name percent-encoded as a single path segment.
pub fn profile_path(username: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    // form encoding writes spaces as '+'; a literal '+' is already %2B
    format!("/u/{}", encoded.replace('+', "%20"))
}

fn parse_db_time(db_time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(db_time, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

pub fn format_timestamp(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| db_time.to_string())
}

pub fn format_date(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| db_time.to_string())
}
