use crate::error::ServiceError;
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "object detector";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

/// Per-frame object detector. One `detect` call per decoded frame.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Readiness probe, called once before a clip is processed.
    async fn load(&self) -> Result<(), ServiceError>;

    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, ServiceError>;
}

/// Detector served over HTTP: `GET {base}/health`, `POST {base}/detect` with
/// a PNG body, answering `{"detections": [{"label", "confidence", "bbox"}]}`
/// where `bbox` is `[x1, y1, x2, y2]` in pixels.
#[derive(Clone)]
pub struct HttpDetector {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<WireDetection>,
}

#[derive(Deserialize)]
struct WireDetection {
    #[serde(alias = "name")]
    label: String,
    #[serde(default)]
    confidence: f32,
    bbox: Option<[f32; 4]>,
}

impl From<WireDetection> for Detection {
    fn from(w: WireDetection) -> Self {
        Detection {
            label: w.label,
            confidence: w.confidence,
            bbox: w.bbox.map(|[x1, y1, x2, y2]| BoundingBox { x1, y1, x2, y2 }),
        }
    }
}

impl HttpDetector {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn encode_png(frame: &RgbImage) -> Result<Vec<u8>, ServiceError> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(frame.clone())
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| ServiceError::unavailable(SERVICE, format!("frame encode failed: {}", e)))?;
        Ok(buf)
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    async fn load(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status { service: SERVICE, status: response.status().as_u16() });
        }
        Ok(())
    }

    async fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, ServiceError> {
        let body = Self::encode_png(frame)?;

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status { service: SERVICE, status: response.status().as_u16() });
        }

        let parsed: DetectResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::malformed(SERVICE, e.to_string()))?;
        debug!("Detector reported {} objects", parsed.detections.len());

        Ok(parsed.detections.into_iter().map(Detection::from).collect())
    }
}
