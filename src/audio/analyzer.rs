use crate::error::ServiceError;
use crate::media::MediaBlob;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "audio analysis";

/// External audio-understanding service: one call per clip, free text back.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    async fn describe(&self, clip: &MediaBlob) -> Result<String, ServiceError>;
}

/// OpenAI-compatible transcription endpoint (multipart `file` + `model`).
#[derive(Clone)]
pub struct TranscriptionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl TranscriptionClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl AudioAnalyzer for TranscriptionClient {
    async fn describe(&self, clip: &MediaBlob) -> Result<String, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable(SERVICE, "no API key configured"))?;

        let file_name = clip.filename.clone().unwrap_or_else(|| "clip.wav".to_string());
        let mime = clip.content_type.clone().unwrap_or_else(|| "application/octet-stream".to_string());
        let part = Part::bytes(clip.bytes.clone())
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(|e| ServiceError::unavailable(SERVICE, e.to_string()))?;
        let form = Form::new().text("model", self.model.clone()).part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status { service: SERVICE, status: response.status().as_u16() });
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::malformed(SERVICE, e.to_string()))?;
        debug!("Audio transcription: {} chars", body.text.len());
        Ok(body.text)
    }
}
