//! Uploaded media, its classification, and the frame-level video seam.

pub mod codec;
pub mod overlay;
pub mod router;

pub use codec::{FfmpegCodec, FrameReader, FrameWriter, VideoCodec, VideoInfo};
pub use router::MediaKind;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Raw upload as received at the boundary.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, filename: Option<String>, content_type: Option<String>) -> Self {
        Self { bytes, filename, content_type }
    }

    /// Lowercased extension of the declared filename, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::classify(self)
    }
}

/// Re-encoded copy of an uploaded video with detection boxes drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedMedia {
    pub id: Uuid,
    /// Server-side location; never sent to clients.
    #[serde(skip_serializing, default)]
    pub path: PathBuf,
    /// Where the HTTP API serves this artifact.
    pub url: String,
    pub format: String,
    pub frame_count: u64,
    pub info: VideoInfo,
}

/// URL path under which the HTTP API serves an annotated artifact.
pub fn artifact_url(id: Uuid) -> String {
    format!("/api/media/{}", id)
}

/// File name used for an annotated artifact inside the media directory.
pub fn artifact_file_name(id: Uuid) -> String {
    format!("{}.mp4", id)
}
