//! HTTP surface: one diagnosis endpoint plus session, media and health routes.

pub mod diagnose;
pub mod health;
pub mod media;
pub mod sessions;

use crate::diagnosis::DiagnosisPipeline;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub use diagnose::diagnose_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use sessions::session_routes;

/// Uploaded clips are far larger than axum's 2 MB default.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DiagnosisPipeline>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<DiagnosisPipeline>) -> Self {
        Self { pipeline, startup_time: Utc::now() }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(diagnose_routes())
        .merge(session_routes())
        .merge(media_routes())
        .merge(health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
