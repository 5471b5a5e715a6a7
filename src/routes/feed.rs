use askama::Template;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::db::{posts, users};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::flash::{Flash, FlashMessage};
use crate::routes::page;
use crate::routes::views::{format_date, PostCard, Viewer};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
    pub profile_username: String,
    pub joined_on: String,
    pub posts: Vec<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/u/{username}", get(profile))
}

/// GET / — every post, newest first
async fn index(
    State(state): State<AppState>,
    user: MaybeUser,
    flash: Flash,
) -> AppResult<Response> {
    let posts = {
        let conn = state.db.get()?;
        posts::list_feed(&conn)?
    };

    Ok(page(
        FeedTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
            posts: posts.into_iter().map(PostCard::from).collect(),
        },
        &flash,
    ))
}

/// GET /u/{username} — one user's posts, newest first
async fn profile(
    State(state): State<AppState>,
    user: MaybeUser,
    flash: Flash,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let (profile_user, posts) = {
        let conn = state.db.get()?;
        let profile_user = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
        let posts = posts::list_by_user(&conn, profile_user.id)?;
        (profile_user, posts)
    };

    Ok(page(
        ProfileTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
            joined_on: format_date(&profile_user.joined_at),
            profile_username: profile_user.username,
            posts: posts.into_iter().map(PostCard::from).collect(),
        },
        &flash,
    ))
}
