use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::warn;

use crate::state::AppState;
use crate::storage::content_type_for;

/// GET /files/{*path}: serve an uploaded image.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let data = match state.storage.read_file(&path).await {
        Ok(Some(data)) => data,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!("Refusing to serve {}: {}", path, e);
            return Err(StatusCode::NOT_FOUND);
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
