#![allow(dead_code)]

use async_trait::async_trait;
use carfix::audio::AudioAnalyzer;
use carfix::diagnosis::VideoReference;
use carfix::error::{MediaError, ServiceError};
use carfix::media::{FrameReader, FrameWriter, MediaBlob, VideoCodec, VideoInfo};
use carfix::services::{KnowledgeHit, KnowledgeSource, VideoLookup};
use carfix::vision::{BoundingBox, Detection, ObjectDetector};
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// --- Video codec ---------------------------------------------------------

/// What the fake encoder received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: PathBuf,
    pub info: VideoInfo,
    pub frames: Vec<RgbImage>,
}

/// Serves `frames` solid black frames; records everything written.
#[derive(Clone)]
pub struct FakeCodec {
    pub info: VideoInfo,
    pub frames: u64,
    pub undecodable: bool,
    pub recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeCodec {
    pub fn new(frames: u64, info: VideoInfo) -> Self {
        Self { info, frames, undecodable: false, recorded: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn undecodable() -> Self {
        Self { undecodable: true, ..Self::new(0, VideoInfo { width: 8, height: 8, fps: 30.0 }) }
    }

    pub fn outputs(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

struct FakeReader {
    info: VideoInfo,
    remaining: u64,
}

#[async_trait]
impl FrameReader for FakeReader {
    fn info(&self) -> VideoInfo {
        self.info
    }

    async fn next_frame(&mut self) -> Result<Option<RgbImage>, MediaError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::from_pixel(self.info.width, self.info.height, Rgb([0, 0, 0]))))
    }
}

struct FakeWriter {
    record: Recorded,
    sink: Arc<Mutex<Vec<Recorded>>>,
}

#[async_trait]
impl FrameWriter for FakeWriter {
    async fn write_frame(&mut self, frame: &RgbImage) -> Result<(), MediaError> {
        self.record.frames.push(frame.clone());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64, MediaError> {
        let count = self.record.frames.len() as u64;
        std::fs::write(&self.record.path, format!("fake mp4 with {} frames", count))?;
        self.sink.lock().unwrap().push(self.record);
        Ok(count)
    }
}

#[async_trait]
impl VideoCodec for FakeCodec {
    async fn open(&self, _path: &Path) -> Result<Box<dyn FrameReader>, MediaError> {
        if self.undecodable {
            return Err(MediaError::DecodeFailure("not a video".to_string()));
        }
        Ok(Box::new(FakeReader { info: self.info, remaining: self.frames }))
    }

    async fn create(&self, path: &Path, info: VideoInfo) -> Result<Box<dyn FrameWriter>, MediaError> {
        // Partial output exists from the moment encoding starts.
        std::fs::write(path, b"")?;
        Ok(Box::new(FakeWriter {
            record: Recorded { path: path.to_path_buf(), info, frames: Vec::new() },
            sink: self.recorded.clone(),
        }))
    }
}

// --- Detector ------------------------------------------------------------

/// Reports `label` on the listed frame indices, counting calls to know
/// which frame it is looking at.
pub struct ScriptedDetector {
    pub hits: HashMap<u64, Vec<&'static str>>,
    pub fail_at: Option<u64>,
    pub loadable: bool,
    calls: AtomicU64,
}

impl ScriptedDetector {
    pub fn new(hits: &[(u64, &'static str)]) -> Self {
        let mut map: HashMap<u64, Vec<&'static str>> = HashMap::new();
        for (frame, label) in hits {
            map.entry(*frame).or_default().push(*label);
        }
        Self { hits: map, fail_at: None, loadable: true, calls: AtomicU64::new(0) }
    }

    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    pub fn unloadable(mut self) -> Self {
        self.loadable = false;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectDetector for ScriptedDetector {
    async fn load(&self) -> Result<(), ServiceError> {
        if self.loadable {
            Ok(())
        } else {
            Err(ServiceError::unavailable("object detector", "model weights missing"))
        }
    }

    async fn detect(&self, _frame: &RgbImage) -> Result<Vec<Detection>, ServiceError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(index) {
            return Err(ServiceError::unavailable("object detector", "connection reset"));
        }
        Ok(self
            .hits
            .get(&index)
            .map(|labels| {
                labels
                    .iter()
                    .map(|label| Detection {
                        label: label.to_string(),
                        confidence: 0.9,
                        bbox: Some(BoundingBox { x1: 1.0, y1: 1.0, x2: 6.0, y2: 6.0 }),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

// --- Knowledge / video lookup -------------------------------------------

/// Answers every query with `count` hits that echo the query.
pub struct EchoKnowledge {
    pub count: usize,
    pub queries: Mutex<Vec<String>>,
}

impl EchoKnowledge {
    pub fn new(count: usize) -> Self {
        Self { count, queries: Mutex::new(Vec::new()) }
    }

    pub fn seen(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeSource for EchoKnowledge {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn lookup(&self, query: &str, _limit: usize) -> Result<Vec<KnowledgeHit>, ServiceError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((1..=self.count)
            .map(|n| KnowledgeHit {
                title: format!("Fix {} for {}", n, query),
                link: Some(format!("https://repair.example/{}", n)),
                details: None,
            })
            .collect())
    }
}

pub struct DownKnowledge;

#[async_trait]
impl KnowledgeSource for DownKnowledge {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn lookup(&self, _query: &str, _limit: usize) -> Result<Vec<KnowledgeHit>, ServiceError> {
        Err(ServiceError::Status { service: "down", status: 503 })
    }
}

pub struct OneVideo;

#[async_trait]
impl VideoLookup for OneVideo {
    async fn lookup(&self, query: &str, _limit: usize) -> Result<Vec<VideoReference>, ServiceError> {
        Ok(vec![VideoReference {
            title: format!("How to fix: {}", query),
            url: "https://www.youtube.com/watch?v=abc123".to_string(),
        }])
    }
}

// --- Audio ---------------------------------------------------------------

pub struct CannedAnalyzer(pub &'static str);

#[async_trait]
impl AudioAnalyzer for CannedAnalyzer {
    async fn describe(&self, _clip: &MediaBlob) -> Result<String, ServiceError> {
        Ok(self.0.to_string())
    }
}

pub struct DownAnalyzer;

#[async_trait]
impl AudioAnalyzer for DownAnalyzer {
    async fn describe(&self, _clip: &MediaBlob) -> Result<String, ServiceError> {
        Err(ServiceError::unavailable("audio analysis", "quota exceeded"))
    }
}

/// One second of a 440 Hz tone as 16-bit mono WAV.
pub fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for t in 0..16_000 {
            let sample = (t as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16_000.0).sin();
            writer.write_sample((sample * i16::MAX as f32 * 0.5) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn small_video_info() -> VideoInfo {
    VideoInfo { width: 16, height: 12, fps: 24.0 }
}
