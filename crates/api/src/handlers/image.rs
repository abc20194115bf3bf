//! Serving generated images from the output directory.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /image/{filename}
///
/// Looks in the output root first, then in the newest batch holding
/// `filename`.
pub async fn serve_root_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let path = state.store.resolve_latest(&filename).await?;
    serve(&path, &filename).await
}

/// GET /image/{batch_id}/{filename}
pub async fn serve_batch_image(
    State(state): State<AppState>,
    Path((batch_id, filename)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let path = state.store.resolve(&[&batch_id, &filename]).await?;
    serve(&path, &filename).await
}

async fn serve(path: &std::path::Path, filename: &str) -> AppResult<impl IntoResponse> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read {}: {e}", path.display())))?;

    let content_type = content_type_for(filename);
    Ok((
        [(CONTENT_TYPE, content_type), (CACHE_CONTROL, "public, max-age=31536000, immutable")],
        bytes,
    ))
}

/// Content type by extension; generated files are PNG.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
