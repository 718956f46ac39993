use crate::audio::analyzer::AudioAnalyzer;
use crate::error::MediaError;
use crate::media::MediaBlob;
use crate::services::fallback::resolve_with_fallback;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// Keyword -> fault tag. Table order is the tag enumeration order.
const FAULT_KEYWORDS: &[(&str, &str)] = &[
    ("knock", "engine knock detected"),
    ("squeak", "brake squeak detected"),
    ("squeal", "brake squeak detected"),
    ("grind", "grinding noise detected"),
    ("rattle", "rattle detected"),
    ("hiss", "hissing sound detected"),
    ("click", "clicking noise detected"),
    ("tick", "clicking noise detected"),
];

/// Case-insensitive substring match of the service text against the fault table.
pub fn match_fault_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for (keyword, tag) in FAULT_KEYWORDS {
        if lower.contains(keyword) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub struct AudioTagger {
    analyzer: Option<Arc<dyn AudioAnalyzer>>,
}

impl AudioTagger {
    pub fn new(analyzer: Option<Arc<dyn AudioAnalyzer>>) -> Self {
        Self { analyzer }
    }

    /// Tags for one clip. Only an undecodable clip is an error; any service
    /// problem yields an empty list.
    pub async fn extract(&self, clip: &MediaBlob) -> Result<Vec<String>, MediaError> {
        validate(clip)?;

        let analyzer = match &self.analyzer {
            Some(a) => a.clone(),
            None => {
                info!("No audio analyzer configured, skipping audio tagging");
                return Ok(Vec::new());
            }
        };

        let text = resolve_with_fallback("audio analysis", analyzer.describe(clip), String::new).await;
        let tags = match_fault_keywords(&text);
        debug!("Audio tags: {:?}", tags);
        Ok(tags)
    }
}

/// Cheap local sanity check before anything is uploaded. WAV headers are
/// parsed fully; compressed formats are left to the service.
fn validate(clip: &MediaBlob) -> Result<(), MediaError> {
    if clip.bytes.is_empty() {
        return Err(MediaError::DecodeFailure("audio clip is empty".to_string()));
    }
    if clip.extension().as_deref() == Some("wav") {
        hound::WavReader::new(Cursor::new(&clip.bytes))
            .map_err(|e| MediaError::DecodeFailure(format!("invalid WAV data: {}", e)))?;
    }
    Ok(())
}
