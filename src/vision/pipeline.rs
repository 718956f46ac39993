use crate::error::{MediaError, ServiceError};
use crate::media::{artifact_file_name, artifact_url, overlay, AnnotatedMedia, FrameWriter, VideoCodec};
use crate::vision::detector::ObjectDetector;
use crate::vision::issue_set::{DetectionEvent, IssueSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the visual extractor produced for one clip.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualOutcome {
    Analyzed { issues: IssueSet, annotated: AnnotatedMedia },
    /// Detector missing, not loadable, or failed mid-clip; or the annotated
    /// copy could not be written.
    Unavailable { reason: String },
    DecodeFailed { reason: String },
}

impl VisualOutcome {
    pub fn issues(&self) -> IssueSet {
        match self {
            VisualOutcome::Analyzed { issues, .. } => issues.clone(),
            _ => IssueSet::new(),
        }
    }

    pub fn annotated(&self) -> Option<&AnnotatedMedia> {
        match self {
            VisualOutcome::Analyzed { annotated, .. } => Some(annotated),
            _ => None,
        }
    }

    /// User-facing note for anything other than a completed analysis.
    pub fn note(&self) -> Option<String> {
        match self {
            VisualOutcome::Analyzed { .. } => None,
            VisualOutcome::Unavailable { reason } => Some(format!("Visual analysis unavailable: {}", reason)),
            VisualOutcome::DecodeFailed { reason } => Some(format!("Video could not be decoded: {}", reason)),
        }
    }
}

enum Failure {
    Detector(ServiceError),
    Media(MediaError),
}

impl From<MediaError> for Failure {
    fn from(e: MediaError) -> Self {
        Failure::Media(e)
    }
}

impl From<ServiceError> for Failure {
    fn from(e: ServiceError) -> Self {
        Failure::Detector(e)
    }
}

/// Frame-by-frame visual issue extractor.
///
/// Frames are decoded, detected, annotated and re-encoded strictly in arrival
/// order, one at a time.
pub struct VisionPipeline {
    detector: Option<Arc<dyn ObjectDetector>>,
    codec: Arc<dyn VideoCodec>,
}

impl VisionPipeline {
    pub fn new(detector: Option<Arc<dyn ObjectDetector>>, codec: Arc<dyn VideoCodec>) -> Self {
        Self { detector, codec }
    }

    pub async fn analyze(&self, source: &Path, output_dir: &Path) -> VisualOutcome {
        let detector = match &self.detector {
            Some(d) => d.clone(),
            None => {
                info!("No object detector configured, skipping visual analysis");
                return VisualOutcome::Unavailable { reason: "no object detector configured".to_string() };
            }
        };

        if let Err(e) = detector.load().await {
            warn!("Object detector failed to load: {}", e);
            return VisualOutcome::Unavailable { reason: e.to_string() };
        }

        let id = Uuid::new_v4();
        let out_path = output_dir.join(artifact_file_name(id));

        match self.run(detector.as_ref(), source, &out_path, id).await {
            Ok((issues, annotated)) => {
                info!(
                    "Visual analysis finished: {} frames, {} distinct issues",
                    annotated.frame_count,
                    issues.len()
                );
                VisualOutcome::Analyzed { issues, annotated }
            }
            Err(failure) => {
                discard_partial(&out_path).await;
                match failure {
                    Failure::Media(MediaError::DecodeFailure(reason)) => {
                        warn!("Video decode failed: {}", reason);
                        VisualOutcome::DecodeFailed { reason }
                    }
                    Failure::Media(e) => {
                        warn!("Annotated video could not be produced: {}", e);
                        VisualOutcome::Unavailable { reason: e.to_string() }
                    }
                    Failure::Detector(e) => {
                        warn!("Object detector failed mid-clip: {}", e);
                        VisualOutcome::Unavailable { reason: e.to_string() }
                    }
                }
            }
        }
    }

    async fn run(
        &self,
        detector: &dyn ObjectDetector,
        source: &Path,
        out_path: &Path,
        id: Uuid,
    ) -> Result<(IssueSet, AnnotatedMedia), Failure> {
        let mut reader = self.codec.open(source).await?;
        let info = reader.info();

        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(MediaError::from)?;
        }
        let mut writer: Box<dyn FrameWriter> = self.codec.create(out_path, info).await?;

        let mut issues = IssueSet::new();
        let mut frame_index: u64 = 0;

        // 1. Pull -> detect -> accumulate -> draw -> push, until the stream ends
        while let Some(mut frame) = reader.next_frame().await? {
            let detections = detector.detect(&frame).await?;

            for det in &detections {
                let event = DetectionEvent { label: det.label.clone(), frame_index };
                if issues.record(event) {
                    debug!("New issue '{}' first seen at frame {}", det.label, frame_index);
                }
            }

            overlay::annotate(&mut frame, &detections);
            writer.write_frame(&frame).await?;
            frame_index += 1;
        }

        // 2. Flush the re-encoded copy
        let frame_count = writer.finish().await?;

        Ok((
            issues,
            AnnotatedMedia {
                id,
                path: PathBuf::from(out_path),
                url: artifact_url(id),
                format: "mp4".to_string(),
                frame_count,
                info,
            },
        ))
    }
}

async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}
