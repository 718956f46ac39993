use crate::media::{AnnotatedMedia, MediaBlob, MediaKind};
use crate::vision::IssueSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAKE: &str = "Toyota";
pub const DEFAULT_MODEL: &str = "Camry";
pub const DEFAULT_YEAR: &str = "2015";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub make: String,
    pub model: String,
    pub year: String,
}

impl VehicleIdentity {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: impl Into<String>) -> Self {
        Self { make: make.into(), model: model.into(), year: year.into() }
    }

    /// Form input: missing or blank fields take the default vehicle's value.
    pub fn from_fields(make: Option<String>, model: Option<String>, year: Option<String>) -> Self {
        fn pick(value: Option<String>, default: &str) -> String {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }
        Self {
            make: pick(make, DEFAULT_MAKE),
            model: pick(model, DEFAULT_MODEL),
            year: pick(year, DEFAULT_YEAR),
        }
    }

    /// "2015 Toyota Camry"
    pub fn label(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

impl Default for VehicleIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_MAKE, DEFAULT_MODEL, DEFAULT_YEAR)
    }
}

/// One user submission. Read-only once built.
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    description: String,
    vehicle: VehicleIdentity,
    media: Option<MediaBlob>,
}

impl DiagnosisRequest {
    pub fn new(description: impl Into<String>, vehicle: VehicleIdentity) -> Self {
        Self { description: description.into(), vehicle, media: None }
    }

    pub fn with_media(mut self, media: MediaBlob) -> Self {
        self.media = Some(media);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn vehicle(&self) -> &VehicleIdentity {
        &self.vehicle
    }

    pub fn media(&self) -> Option<&MediaBlob> {
        self.media.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseOrigin {
    Audio,
    Visual,
    User,
}

impl CauseOrigin {
    pub fn prefix(&self) -> &'static str {
        match self {
            CauseOrigin::Audio => "Audio analysis",
            CauseOrigin::Visual => "Visual inspection",
            CauseOrigin::User => "User description",
        }
    }
}

/// A probable explanation. `text` carries the provenance phrase and is the
/// value causes are deduplicated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub origin: CauseOrigin,
    pub detail: String,
    pub text: String,
}

impl Cause {
    pub fn new(origin: CauseOrigin, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let text = format!("{}: {}", origin.prefix(), detail);
        Self { origin, detail, text }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub title: String,
    pub source: Option<String>,
    pub price_estimate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    pub title: String,
    pub url: String,
}

/// Solutions and videos found for one cause (or the whole request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseSolutions {
    pub cause: String,
    pub query: String,
    pub solutions: Vec<Solution>,
    pub videos: Vec<VideoReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicListing {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub rating: f32,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostOptions {
    #[serde(rename = "DIY")]
    pub diy: String,
    #[serde(rename = "Mechanic")]
    pub mechanic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub vehicle: VehicleIdentity,
    pub media_kind: Option<MediaKind>,
    pub visual_issues: IssueSet,
    pub audio_tags: Vec<String>,
    pub annotated_media: Option<AnnotatedMedia>,
    pub causes: Vec<Cause>,
    pub solutions: Vec<CauseSolutions>,
    pub parts: Vec<PartLink>,
    pub mechanic: MechanicListing,
    pub options: CostOptions,
    /// Why an analysis step was skipped, if any.
    pub notes: Vec<String>,
}

impl DiagnosisResult {
    pub fn cause_texts(&self) -> Vec<&str> {
        self.causes.iter().map(|c| c.text.as_str()).collect()
    }
}
