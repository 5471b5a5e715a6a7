use askama::Template;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{LikeToggle, PostSummary};
use crate::db::{comments, likes, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser, PostId};
use crate::flash::{self, Flash, FlashMessage};
use crate::media;
use crate::routes::page;
use crate::routes::views::{CommentView, PostCard, Viewer};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/new_post.html")]
pub struct NewPostTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub current_user: Option<Viewer>,
    pub flash: Option<FlashMessage>,
    pub post: PostCard,
    pub comments: Vec<CommentView>,
    pub liked: bool,
}

// --- Forms ---

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Fields of the multipart new-post form.
#[derive(Debug, Default)]
pub struct NewPostForm {
    pub caption: Option<String>,
    pub image_name: Option<String>,
    pub image: Vec<u8>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new_post_page).post(create_post))
        .route("/p/{id}", get(view_post).post(add_comment))
        .route("/like/{id}", post(toggle_like))
}

// --- Handlers ---

/// GET /new — upload form; anonymous visitors are sent to log in
async fn new_post_page(user: MaybeUser, flash: Flash) -> Response {
    if user.0.is_none() {
        return flash::redirect("/login", FlashMessage::info("Please log in to post."));
    }

    page(
        NewPostTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
        },
        &flash,
    )
}

/// POST /new — store the image, then record the post
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_new_post_form(multipart).await?;

    let original_name = match media::validate_upload(form.image_name.as_deref()) {
        Ok(name) => name,
        Err(e) => return Ok(flash::redirect("/new", FlashMessage::error(e.to_string()))),
    };

    let preferred = media::upload_filename(user.id, Utc::now().timestamp(), original_name);
    let stored = state.media.store(&preferred, &form.image).await?;

    let inserted = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| {
            posts::insert_post(&conn, user.id, &stored, form.caption.as_deref())
                .map_err(AppError::from)
        });

    match inserted {
        Ok(post_id) => {
            tracing::info!(post_id, user_id = user.id, "Stored upload as {}", stored);
            Ok(flash::redirect("/", FlashMessage::success("Post created.")))
        }
        Err(e) => {
            // No post row, so the file must not linger either
            if let Err(cleanup) = state.media.remove(&stored).await {
                tracing::warn!("Could not remove orphaned upload {}: {}", stored, cleanup);
            }
            Err(e)
        }
    }
}

/// GET /p/{id} — post detail with comments and the viewer's like state
async fn view_post(
    State(state): State<AppState>,
    user: MaybeUser,
    flash: Flash,
    PostId(id): PostId,
) -> AppResult<Response> {
    let (summary, comment_list, liked) = {
        let conn = state.db.get()?;
        let post = posts::get_post(&conn, id)?.ok_or(AppError::NotFound)?;
        let owner = posts::get_owner(&conn, id)?.ok_or(AppError::NotFound)?;
        let summary = PostSummary {
            post,
            username: owner.username,
            like_count: likes::count_likes(&conn, id)?,
            comment_count: comments::count_comments(&conn, id)?,
        };
        let comment_list = comments::list_for_post(&conn, id)?;
        let liked = match user.id() {
            Some(uid) => likes::has_liked(&conn, uid, id)?,
            None => false,
        };
        (summary, comment_list, liked)
    };

    Ok(page(
        PostTemplate {
            current_user: Viewer::of(&user),
            flash: flash.0.clone(),
            post: PostCard::from(summary),
            comments: comment_list.into_iter().map(CommentView::from).collect(),
            liked,
        },
        &flash,
    ))
}

/// POST /p/{id} — add a comment; blank text is ignored
async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    PostId(id): PostId,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let target = format!("/p/{}", id);
    let conn = state.db.get()?;

    if !posts::post_exists(&conn, id)? {
        return Err(AppError::NotFound);
    }

    let text = form.text.trim();
    if text.is_empty() {
        return Ok(Redirect::to(&target).into_response());
    }

    comments::insert_comment(&conn, user.id, id, text)?;
    Ok(flash::redirect(&target, FlashMessage::success("Comment added.")))
}

/// POST /like/{id} — like or unlike, then go back where the user came from
async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    PostId(id): PostId,
    headers: HeaderMap,
) -> AppResult<Response> {
    let outcome = {
        let conn = state.db.get()?;
        if !posts::post_exists(&conn, id)? {
            return Err(AppError::NotFound);
        }
        likes::toggle_like(&conn, user.id, id)?
    };

    let message = match outcome {
        LikeToggle::Liked => FlashMessage::success("You liked this post."),
        LikeToggle::Unliked => FlashMessage::info("You no longer like this post."),
    };

    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(local_path)
        .unwrap_or_else(|| format!("/p/{}", id));

    Ok(flash::redirect(&back, message))
}

// --- Helpers ---

/// Collect the `caption` and `image` fields; anything else is skipped.
async fn read_new_post_form(mut multipart: Multipart) -> AppResult<NewPostForm> {
    let mut form = NewPostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("caption") => {
                let caption = field.text().await?;
                let caption = caption.trim();
                if !caption.is_empty() {
                    form.caption = Some(caption.to_string());
                }
            }
            Some("image") => {
                form.image_name = field.file_name().map(str::to_string);
                form.image = field.bytes().await?.to_vec();
            }
            _ => continue,
        }
    }

    Ok(form)
}

/// Reduce a `Referer` to its path and query so redirects stay on this site.
fn local_path(referer: &str) -> Option<String> {
    if referer.starts_with('/') && !referer.starts_with("//") {
        return Some(referer.to_string());
    }

    let url = url::Url::parse(referer).ok()?;
    let mut path = url.path().to_string();
    // A path of "//host/..." would read as protocol-relative in Location
    if path.starts_with("//") {
        return None;
    }
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}
