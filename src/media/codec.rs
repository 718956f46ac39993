//! Frame-level video decode/encode.
//!
//! Container work is delegated to external `ffprobe`/`ffmpeg` processes that
//! stream raw RGB24 frames over pipes. Frames are pulled one at a time.

use crate::error::MediaError;
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// Used when the source does not report a usable frame rate.
pub const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoInfo {
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

#[async_trait]
pub trait FrameReader: Send {
    fn info(&self) -> VideoInfo;

    /// Next decoded frame in arrival order, `None` once the stream is exhausted.
    async fn next_frame(&mut self) -> Result<Option<RgbImage>, MediaError>;
}

#[async_trait]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, frame: &RgbImage) -> Result<(), MediaError>;

    /// Flush the stream. Returns the number of frames written.
    async fn finish(self: Box<Self>) -> Result<u64, MediaError>;
}

#[async_trait]
pub trait VideoCodec: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, MediaError>;

    async fn create(&self, path: &Path, info: VideoInfo) -> Result<Box<dyn FrameWriter>, MediaError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegCodec {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self { ffmpeg: ffmpeg.into(), ffprobe: ffprobe.into() }
    }

    async fn probe(&self, path: &Path) -> Result<VideoInfo, MediaError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height,r_frame_rate"])
            .args(["-of", "json"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::DecodeFailure(format!("could not run {}: {}", self.ffprobe, e)))?;

        if !output.status.success() {
            return Err(MediaError::DecodeFailure(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        parse_probe(&output.stdout)
    }
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

fn parse_probe(json: &[u8]) -> Result<VideoInfo, MediaError> {
    let probe: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| MediaError::DecodeFailure(format!("unreadable probe output: {}", e)))?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaError::DecodeFailure("no video stream".to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MediaError::DecodeFailure("video stream has no dimensions".to_string())),
    };
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(DEFAULT_FPS);

    Ok(VideoInfo { width, height, fps })
}

/// "30000/1001" -> 29.97. Zero or malformed rates yield `None`.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((n, d)) => (n.trim().parse::<f64>().ok()?, d.trim().parse::<f64>().ok()?),
        None => (rate.trim().parse::<f64>().ok()?, 1.0),
    };
    if num <= 0.0 || den <= 0.0 {
        return None;
    }
    Some(num / den)
}

#[async_trait]
impl VideoCodec for FfmpegCodec {
    async fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, MediaError> {
        let info = self.probe(path).await?;
        debug!("Decoding {} ({}x{} @ {:.2} fps)", path.display(), info.width, info.height, info.fps);

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::DecodeFailure(format!("could not run {}: {}", self.ffmpeg, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::DecodeFailure("decoder has no output pipe".to_string()))?;

        Ok(Box::new(FfmpegReader { child, stdout, info, done: false }))
    }

    async fn create(&self, path: &Path, info: VideoInfo) -> Result<Box<dyn FrameWriter>, MediaError> {
        let size = format!("{}x{}", info.width, info.height);
        let rate = format!("{}", info.fps);

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", size.as_str(), "-r", rate.as_str(), "-i", "-"])
            .args(["-c:v", "mpeg4", "-q:v", "5", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::EncodeFailure(format!("could not run {}: {}", self.ffmpeg, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::EncodeFailure("encoder has no input pipe".to_string()))?;

        Ok(Box::new(FfmpegWriter { child, stdin: Some(stdin), info, frames: 0 }))
    }
}

struct FfmpegReader {
    child: Child,
    stdout: ChildStdout,
    info: VideoInfo,
    done: bool,
}

#[async_trait]
impl FrameReader for FfmpegReader {
    fn info(&self) -> VideoInfo {
        self.info
    }

    async fn next_frame(&mut self) -> Result<Option<RgbImage>, MediaError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.info.frame_bytes()];
        if !fill_frame(&mut self.stdout, &mut buf).await? {
            self.done = true;
            let status = self.child.wait().await?;
            check_status(status, MediaError::DecodeFailure)?;
            return Ok(None);
        }
        let frame = RgbImage::from_raw(self.info.width, self.info.height, buf)
            .ok_or_else(|| MediaError::DecodeFailure("frame size mismatch".to_string()))?;
        Ok(Some(frame))
    }
}

/// Reads exactly one raw frame. `Ok(false)` means the stream ended cleanly on
/// a frame boundary; ending partway through a frame is a decode failure.
async fn fill_frame<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> Result<bool, MediaError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    match filled {
        0 => Ok(false),
        n if n == buf.len() => Ok(true),
        n => Err(MediaError::DecodeFailure(format!(
            "stream ended inside a frame ({} of {} bytes)",
            n,
            buf.len()
        ))),
    }
}

struct FfmpegWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    info: VideoInfo,
    frames: u64,
}

#[async_trait]
impl FrameWriter for FfmpegWriter {
    async fn write_frame(&mut self, frame: &RgbImage) -> Result<(), MediaError> {
        if frame.width() != self.info.width || frame.height() != self.info.height {
            return Err(MediaError::EncodeFailure(format!(
                "frame is {}x{}, stream is {}x{}",
                frame.width(),
                frame.height(),
                self.info.width,
                self.info.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::EncodeFailure("encoder input already closed".to_string()))?;
        stdin.write_all(frame.as_raw()).await?;
        self.frames += 1;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> Result<u64, MediaError> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await?;
        }
        let status = self.child.wait().await?;
        check_status(status, MediaError::EncodeFailure)?;
        Ok(self.frames)
    }
}

fn check_status(status: ExitStatus, err: fn(String) -> MediaError) -> Result<(), MediaError> {
    if status.success() {
        Ok(())
    } else {
        Err(err(format!("ffmpeg exited with {}", status)))
    }
}
