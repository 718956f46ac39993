use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::media::artifact_file_name;

/// GET /api/media/:id
///
/// Serves an annotated clip written by the vision pipeline.
pub async fn annotated_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(format!("media {}", id)))?;
    let path = state.pipeline.media_dir().join(artifact_file_name(id));

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("media {}", id)));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(([(header::CONTENT_TYPE, "video/mp4")], bytes))
}

pub fn media_routes() -> Router<AppState> {
    Router::new().route("/api/media/:id", get(annotated_media))
}
