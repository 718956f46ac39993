//! Service configuration.
//!
//! Resolution order: compiled defaults, then the optional TOML file, then
//! credential/endpoint environment variables.

use crate::error::ConfigError;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub audio: AudioConfig,
    pub knowledge: KnowledgeConfig,
    pub video_lookup: VideoLookupConfig,
    pub parts: PartsConfig,
    pub costs: CostConfig,
    pub media: MediaConfig,
    /// Applied to every outbound HTTP client.
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            detector: DetectorConfig::default(),
            audio: AudioConfig::default(),
            knowledge: KnowledgeConfig::default(),
            video_lookup: VideoLookupConfig::default(),
            parts: PartsConfig::default(),
            costs: CostConfig::default(),
            media: MediaConfig::default(),
            http_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

/// Object detection service. `url: None` disables visual analysis.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeProvider {
    Completion,
    Search,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub provider: KnowledgeProvider,
    pub max_results: usize,
    pub completion_endpoint: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    pub openai_api_key: Option<String>,
    pub search_endpoint: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            provider: KnowledgeProvider::Completion,
            max_results: 3,
            completion_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            completion_model: "gpt-4".to_string(),
            completion_max_tokens: 500,
            openai_api_key: None,
            search_endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            search_api_key: None,
            search_engine_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoLookupConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub max_results: usize,
    pub api_key: Option<String>,
}

impl Default for VideoLookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://www.googleapis.com/youtube/v3/search".to_string(),
            max_results: 2,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PartsConfig {
    pub shop_url: String,
    pub query_param: String,
    pub items: Vec<String>,
}

impl Default for PartsConfig {
    fn default() -> Self {
        Self {
            shop_url: "https://www.amazon.com/s".to_string(),
            query_param: "k".to_string(),
            items: vec![
                "Engine oil".to_string(),
                "Spark plugs".to_string(),
                "Brake pads".to_string(),
                "Air filter".to_string(),
                "Serpentine belt".to_string(),
            ],
        }
    }
}

/// Rough repair cost figures in dollars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub diy: u32,
    pub mechanic: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self { diy: 50, mechanic: 120 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Where annotated videos are kept for the lifetime of the session.
    pub output_dir: PathBuf,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir().join("carfix-media"),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Environment wins over the file for credentials and service endpoints.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.knowledge.openai_api_key = Some(key.clone());
            if self.audio.api_key.is_none() {
                self.audio.api_key = Some(key);
            }
        }
        if let Some(key) = get("AUDIO_API_KEY") {
            self.audio.api_key = Some(key);
        }
        if let Some(key) = get("SEARCH_API_KEY") {
            self.knowledge.search_api_key = Some(key);
        }
        if let Some(id) = get("SEARCH_ENGINE_ID") {
            self.knowledge.search_engine_id = Some(id);
        }
        if let Some(key) = get("YOUTUBE_API_KEY") {
            self.video_lookup.api_key = Some(key);
        }
        if let Some(url) = get("DETECTOR_URL") {
            self.detector.url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.parts.shop_url).map_err(|e| ConfigError::Invalid {
            field: "parts.shop_url",
            reason: e.to_string(),
        })?;
        if self.knowledge.max_results == 0 {
            return Err(ConfigError::Invalid {
                field: "knowledge.max_results",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(url) = &self.detector.url {
            Url::parse(url).map_err(|e| ConfigError::Invalid {
                field: "detector.url",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
