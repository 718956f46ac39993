use crate::audio::{AudioAnalyzer, AudioTagger, TranscriptionClient};
use crate::config::{Config, CostConfig, KnowledgeProvider};
use crate::diagnosis::aggregator::aggregate_causes;
use crate::diagnosis::history::{HistoryStore, InMemoryHistoryStore, SessionId};
use crate::diagnosis::presenter::{Findings, Presenter};
use crate::diagnosis::types::{Cause, CauseSolutions, DiagnosisRequest, DiagnosisResult, VehicleIdentity};
use crate::error::{ConfigError, MediaError};
use crate::media::{FfmpegCodec, MediaBlob, MediaKind, VideoCodec};
use crate::parts::PartsCatalog;
use crate::services::{
    resolve_with_fallback, CompletionSource, KnowledgeSource, SolutionResolver, VideoLookup,
    WebSearchSource, YouTubeLookup,
};
use crate::vision::{HttpDetector, ObjectDetector, VisionPipeline, VisualOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Runs one request through collect -> route -> extract -> aggregate ->
/// resolve -> format, then appends the result to the session history.
pub struct DiagnosisPipeline {
    vision: VisionPipeline,
    audio: AudioTagger,
    resolver: SolutionResolver,
    videos: Option<Arc<dyn VideoLookup>>,
    video_limit: usize,
    presenter: Presenter,
    history: Arc<dyn HistoryStore>,
    media_dir: PathBuf,
    // One diagnosis at a time per process.
    gate: Mutex<()>,
}

impl DiagnosisPipeline {
    pub fn builder(config: &Config) -> Result<PipelineBuilder, ConfigError> {
        PipelineBuilder::from_config(config)
    }

    pub fn history(&self) -> Arc<dyn HistoryStore> {
        self.history.clone()
    }

    pub fn media_dir(&self) -> &std::path::Path {
        &self.media_dir
    }

    /// Drops the session's history and deletes the annotated media it owned.
    /// Returns how many entries were removed.
    pub async fn end_session(&self, session: SessionId) -> usize {
        let entries = self.history.clear(session);
        for entry in &entries {
            if let Some(media) = &entry.annotated_media {
                remove_artifact(&media.path).await;
            }
        }
        info!("Session {} ended, {} entries dropped", session, entries.len());
        entries.len()
    }

    /// Never fails: every analysis problem ends up as a note on the result.
    pub async fn diagnose(&self, session: SessionId, request: DiagnosisRequest) -> Arc<DiagnosisResult> {
        let _running = self.gate.lock().await;
        info!("Diagnosing for session {} ({})", session, request.vehicle().label());

        let mut notes = Vec::new();
        let mut audio_tags = Vec::new();
        let mut visual: Option<VisualOutcome> = None;
        let media_kind = request.media().map(MediaBlob::kind);

        // 1. Route + extract
        if let (Some(blob), Some(kind)) = (request.media(), media_kind) {
            match kind {
                MediaKind::Audio => match self.audio.extract(blob).await {
                    Ok(tags) => audio_tags = tags,
                    Err(e) => {
                        warn!("Audio analysis skipped: {}", e);
                        notes.push(format!("Audio could not be analyzed: {}", e));
                    }
                },
                MediaKind::Video => match self.analyze_video(blob).await {
                    Ok(outcome) => {
                        notes.extend(outcome.note());
                        visual = Some(outcome);
                    }
                    Err(e) => {
                        warn!("Could not stage upload: {}", e);
                        notes.push(format!("Visual analysis unavailable: {}", e));
                    }
                },
                MediaKind::Unrecognized => {
                    debug!("Attachment {:?} is not analyzable", blob.filename);
                    notes.push("Attached file type is not supported for analysis".to_string());
                }
            }
        }

        let visual_issues = visual.as_ref().map(VisualOutcome::issues).unwrap_or_default();
        let annotated_media = visual.as_ref().and_then(|v| v.annotated().cloned());

        // 2. Aggregate
        let causes = aggregate_causes(&audio_tags, &visual_issues, request.description());

        // 3. Resolve
        let solutions = self.resolve_all(&causes, request.vehicle(), request.description()).await;

        // 4. Format + record
        let result = Arc::new(self.presenter.assemble(Findings {
            description: request.description().to_string(),
            vehicle: request.vehicle().clone(),
            media_kind,
            visual_issues,
            audio_tags,
            annotated_media,
            causes,
            solutions,
            notes,
        }));
        self.history.append(session, result.clone());
        info!("Diagnosis {} recorded with {} causes", result.id, result.causes.len());
        result
    }

    /// The staged upload lives exactly as long as this call.
    async fn analyze_video(&self, blob: &MediaBlob) -> Result<VisualOutcome, MediaError> {
        let staged = stage_upload(blob).await?;
        let outcome = self.vision.analyze(staged.path(), &self.media_dir).await;
        drop(staged);
        Ok(outcome)
    }

    async fn resolve_all(&self, causes: &[Cause], vehicle: &VehicleIdentity, description: &str) -> Vec<CauseSolutions> {
        let queries: Vec<(String, String)> = if causes.is_empty() {
            let topic = if description.trim().is_empty() { "common problems" } else { description.trim() };
            vec![("General".to_string(), format!("{} {}", vehicle.label(), topic))]
        } else {
            causes
                .iter()
                .map(|c| (c.text.clone(), format!("{} {}", vehicle.label(), c.detail)))
                .collect()
        };

        let mut groups = Vec::with_capacity(queries.len());
        for (cause, query) in queries {
            let solutions = self.resolver.resolve(&query).await;
            let videos = match &self.videos {
                Some(lookup) => {
                    resolve_with_fallback("video lookup", lookup.lookup(&query, self.video_limit), Vec::new).await
                }
                None => Vec::new(),
            };
            groups.push(CauseSolutions { cause, query, solutions, videos });
        }
        groups
    }
}

/// Deletes one annotated artifact. Already-missing files are fine.
pub async fn remove_artifact(path: &std::path::Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

async fn stage_upload(blob: &MediaBlob) -> Result<NamedTempFile, MediaError> {
    let suffix = blob.extension().map(|e| format!(".{}", e)).unwrap_or_else(|| ".mp4".to_string());
    let staged = tempfile::Builder::new().prefix("carfix-upload-").suffix(&suffix).tempfile()?;
    tokio::fs::write(staged.path(), &blob.bytes).await?;
    debug!("Staged {} bytes at {}", blob.bytes.len(), staged.path().display());
    Ok(staged)
}

/// Wires the pipeline from config; every seam can be replaced before `build`.
pub struct PipelineBuilder {
    detector: Option<Arc<dyn ObjectDetector>>,
    codec: Arc<dyn VideoCodec>,
    audio: Option<Arc<dyn AudioAnalyzer>>,
    knowledge: Arc<dyn KnowledgeSource>,
    videos: Option<Arc<dyn VideoLookup>>,
    video_limit: usize,
    max_results: usize,
    history: Arc<dyn HistoryStore>,
    parts: PartsCatalog,
    costs: CostConfig,
    media_dir: PathBuf,
}

impl PipelineBuilder {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let detector: Option<Arc<dyn ObjectDetector>> = config
            .detector
            .url
            .as_ref()
            .map(|url| Arc::new(HttpDetector::new(url.clone(), timeout)) as Arc<dyn ObjectDetector>);

        let audio: Arc<dyn AudioAnalyzer> = Arc::new(TranscriptionClient::new(
            config.audio.endpoint.clone(),
            config.audio.model.clone(),
            config.audio.api_key.clone(),
            timeout,
        ));

        let k = &config.knowledge;
        let knowledge: Arc<dyn KnowledgeSource> = match k.provider {
            KnowledgeProvider::Completion => Arc::new(CompletionSource::new(
                k.completion_endpoint.clone(),
                k.completion_model.clone(),
                k.completion_max_tokens,
                k.openai_api_key.clone(),
                timeout,
            )),
            KnowledgeProvider::Search => Arc::new(WebSearchSource::new(
                k.search_endpoint.clone(),
                k.search_api_key.clone(),
                k.search_engine_id.clone(),
                timeout,
            )),
        };

        let videos: Option<Arc<dyn VideoLookup>> = if config.video_lookup.enabled {
            Some(Arc::new(YouTubeLookup::new(
                config.video_lookup.endpoint.clone(),
                config.video_lookup.api_key.clone(),
                timeout,
            )))
        } else {
            None
        };

        Ok(Self {
            detector,
            codec: Arc::new(FfmpegCodec::new(config.media.ffmpeg.clone(), config.media.ffprobe.clone())),
            audio: Some(audio),
            knowledge,
            videos,
            video_limit: config.video_lookup.max_results,
            max_results: k.max_results,
            history: Arc::new(InMemoryHistoryStore::new()),
            parts: PartsCatalog::from_config(&config.parts)?,
            costs: config.costs.clone(),
            media_dir: config.media.output_dir.clone(),
        })
    }

    pub fn detector(mut self, detector: Option<Arc<dyn ObjectDetector>>) -> Self {
        self.detector = detector;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn VideoCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn audio_analyzer(mut self, analyzer: Option<Arc<dyn AudioAnalyzer>>) -> Self {
        self.audio = analyzer;
        self
    }

    pub fn knowledge(mut self, source: Arc<dyn KnowledgeSource>) -> Self {
        self.knowledge = source;
        self
    }

    pub fn video_lookup(mut self, lookup: Option<Arc<dyn VideoLookup>>) -> Self {
        self.videos = lookup;
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = dir.into();
        self
    }

    pub fn build(self) -> DiagnosisPipeline {
        DiagnosisPipeline {
            vision: VisionPipeline::new(self.detector, self.codec),
            audio: AudioTagger::new(self.audio),
            resolver: SolutionResolver::new(self.knowledge, self.max_results, Presenter::price_estimate(&self.costs)),
            videos: self.videos,
            video_limit: self.video_limit,
            presenter: Presenter::new(self.parts, self.costs),
            history: self.history,
            media_dir: self.media_dir,
            gate: Mutex::new(()),
        }
    }
}

