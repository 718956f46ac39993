//! Round trips through the real ffmpeg/ffprobe binaries. Skipped when they are
//! not installed.

use carfix::media::{FfmpegCodec, VideoCodec, VideoInfo};
use image::{Rgb, RgbImage};

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        std::process::Command::new(bin)
            .arg("-version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    })
}

fn info() -> VideoInfo {
    VideoInfo { width: 64, height: 48, fps: 10.0 }
}

#[tokio::test]
async fn test_encode_then_decode_keeps_geometry_and_count() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    let codec = FfmpegCodec::default();

    let mut writer = codec.create(&path, info()).await.unwrap();
    for shade in 0..5u8 {
        writer.write_frame(&RgbImage::from_pixel(64, 48, Rgb([shade * 40, 80, 120]))).await.unwrap();
    }
    assert_eq!(writer.finish().await.unwrap(), 5);

    let mut reader = codec.open(&path).await.unwrap();
    let decoded = reader.info();
    assert_eq!((decoded.width, decoded.height), (64, 48));
    assert!((decoded.fps - 10.0).abs() < 0.01);

    let mut frames = 0;
    while let Some(frame) = reader.next_frame().await.unwrap() {
        assert_eq!(frame.dimensions(), (64, 48));
        frames += 1;
    }
    assert_eq!(frames, 5);
}

#[tokio::test]
async fn test_zero_frame_encode_finishes() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let codec = FfmpegCodec::default();

    let writer = codec.create(&dir.path().join("empty.mp4"), info()).await.unwrap();

    assert_eq!(writer.finish().await.unwrap(), 0);
}

#[tokio::test]
async fn test_writer_rejects_wrong_frame_size() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let codec = FfmpegCodec::default();
    let mut writer = codec.create(&dir.path().join("bad.mp4"), info()).await.unwrap();

    assert!(writer.write_frame(&RgbImage::new(32, 32)).await.is_err());
}

#[tokio::test]
async fn test_non_video_input_is_decode_failure() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.mp4");
    std::fs::write(&path, b"definitely not a video").unwrap();

    let err = FfmpegCodec::default().open(&path).await.err().unwrap();

    assert!(matches!(err, carfix::error::MediaError::DecodeFailure(_)));
}
