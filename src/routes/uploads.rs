use axum::extract::{Path, State};
use axum::response::Response;

use crate::error::{AppError, AppResult};
use crate::routes::file_response;
use crate::state::AppState;

/// GET /uploads/{filename} — serve a stored image
pub async fn serve(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let data = state
        .media
        .load(&filename)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(file_response(&filename, data))
}
