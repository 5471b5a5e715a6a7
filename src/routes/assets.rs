use axum::extract::Path;
use axum::response::Response;
use rust_embed::Embed;

use crate::error::{AppError, AppResult};
use crate::routes::file_response;

#[derive(Embed)]
#[folder = "assets/"]
struct StaticFiles;

/// GET /static/{*path} — the stylesheet, compiled into the binary
pub async fn serve(Path(path): Path<String>) -> AppResult<Response> {
    let file = StaticFiles::get(&path).ok_or(AppError::NotFound)?;
    Ok(file_response(&path, file.data.into_owned()))
}
