pub mod assets;
pub mod auth;
pub mod feed;
pub mod posts;
pub mod uploads;
pub mod views;

use askama::Template;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::flash::Flash;
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Raw file bytes with a content type guessed from `name`.
pub fn file_response(name: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response()
}

/// Render a page and consume the pending flash message it displays.
pub fn page<T: Template>(template: T, flash: &Flash) -> Response {
    (AppendHeaders(flash.clear_header()), Html(template)).into_response()
}

/// The full application router.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .merge(feed::router())
        .merge(auth::router())
        .merge(posts::router())
        .route("/uploads/{filename}", get(uploads::serve))
        .route("/static/{*path}", get(assets::serve))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(resp: &Response) -> &str {
        resp.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[test]
    fn file_response_guesses_content_type() {
        let resp = file_response("1_100_cat.png", vec![1, 2, 3]);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(content_type(&resp), "image/png");
        assert_eq!(content_type(&file_response("css/style.css", Vec::new())), "text/css");
    }

    #[test]
    fn file_response_falls_back_to_octet_stream() {
        let resp = file_response("no-extension", Vec::new());
        assert_eq!(content_type(&resp), "application/octet-stream");
        assert!(resp.headers().contains_key(header::CACHE_CONTROL));
    }
}
