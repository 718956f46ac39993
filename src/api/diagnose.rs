//! POST /api/diagnose_ai

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{AppState, SESSION_HEADER};
use crate::diagnosis::{DiagnosisRequest, DiagnosisResult, SessionId, VehicleIdentity};
use crate::error::{ApiError, ApiResult};
use crate::media::MediaBlob;

#[derive(Debug, Serialize)]
pub struct DiagnoseResponse {
    pub ok: bool,
    pub session_id: SessionId,
    pub diagnosis: Arc<DiagnosisResult>,
}

/// Form fields as they arrive; every one of them is optional on the wire.
#[derive(Debug, Default)]
struct DiagnoseForm {
    description: Option<String>,
    make: Option<String>,
    model: Option<String>,
    year: Option<String>,
    file: Option<MediaBlob>,
}

impl DiagnoseForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = DiagnoseForm::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(bad_multipart)?;
                    // Browsers send an empty part when no file was picked.
                    if !bytes.is_empty() {
                        form.file = Some(MediaBlob::new(bytes.to_vec(), filename, content_type));
                    }
                }
                "description" => form.description = Some(field.text().await.map_err(bad_multipart)?),
                "vehicle_make" => form.make = Some(field.text().await.map_err(bad_multipart)?),
                "vehicle_model" => form.model = Some(field.text().await.map_err(bad_multipart)?),
                "vehicle_year" => form.year = Some(field.text().await.map_err(bad_multipart)?),
                other => debug!("Ignoring form field {:?}", other),
            }
        }
        Ok(form)
    }

    fn into_request(self) -> ApiResult<DiagnosisRequest> {
        let description = self
            .description
            .ok_or_else(|| ApiError::BadRequest("description field is required".to_string()))?;
        let vehicle = VehicleIdentity::from_fields(self.make, self.model, self.year);
        let request = DiagnosisRequest::new(description, vehicle);
        Ok(match self.file {
            Some(blob) => request.with_media(blob),
            None => request,
        })
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("malformed multipart body: {}", e))
}

/// Reuses the caller's session when the header holds a valid id.
pub fn session_from_headers(headers: &HeaderMap) -> SessionId {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

pub async fn diagnose_ai(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<DiagnoseResponse>> {
    let session = session_from_headers(&headers);
    let request = DiagnoseForm::read(multipart).await?.into_request()?;
    info!(session = %session, has_media = request.media().is_some(), "Diagnosis request");

    let diagnosis = state.pipeline.diagnose(session, request).await;
    Ok(Json(DiagnoseResponse { ok: true, session_id: session, diagnosis }))
}

pub fn diagnose_routes() -> Router<AppState> {
    Router::new().route("/api/diagnose_ai", post(diagnose_ai))
}
