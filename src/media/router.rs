use super::MediaBlob;
use serde::{Deserialize, Serialize};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/mp4",
    "audio/x-m4a",
];
const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/quicktime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
    Unrecognized,
}

impl MediaKind {
    /// Pure classification. A recognized extension decides; otherwise the
    /// declared content type is consulted.
    pub fn classify(blob: &MediaBlob) -> MediaKind {
        if let Some(kind) = blob.extension().as_deref().and_then(Self::from_extension) {
            return kind;
        }
        blob.content_type
            .as_deref()
            .and_then(Self::from_mime)
            .unwrap_or(MediaKind::Unrecognized)
    }

    pub fn from_extension(ext: &str) -> Option<MediaKind> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_mime(mime: &str) -> Option<MediaKind> {
        // Drop parameters such as "; codecs=..."
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if AUDIO_MIME_TYPES.contains(&essence.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_MIME_TYPES.contains(&essence.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}
