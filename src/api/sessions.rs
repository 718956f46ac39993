use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::api::AppState;
use crate::diagnosis::{DiagnosisResult, SessionId};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub ok: bool,
    pub session_id: SessionId,
    pub history: Vec<Arc<DiagnosisResult>>,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub ok: bool,
    pub session_id: SessionId,
    pub cleared: usize,
}

fn parse_session(raw: &str) -> ApiResult<SessionId> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid session id: {}", raw)))
}

/// GET /api/sessions/:id/history
///
/// Oldest first. Unknown sessions have an empty history.
pub async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let session = parse_session(&id)?;
    let history = state.pipeline.history().entries(session);
    Ok(Json(HistoryResponse { ok: true, session_id: session, history }))
}

/// DELETE /api/sessions/:id
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EndSessionResponse>> {
    let session = parse_session(&id)?;
    let cleared = state.pipeline.end_session(session).await;
    info!(session = %session, cleared, "Session ended");
    Ok(Json(EndSessionResponse { ok: true, session_id: session, cleared }))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:id/history", get(session_history))
        .route("/api/sessions/:id", delete(end_session))
}
