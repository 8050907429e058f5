//! Last-frame extraction from finished clips.
//!
//! The whole decode runs as one suspend-until-ready operation under a fixed
//! deadline and resolves to exactly one of: a frame, `ExtractionTimeout`, or
//! `ExtractionFailed`. Scratch files live in a `TempDir` and FFmpeg/FFprobe are
//! spawned with `kill_on_drop`, so every exit path (including the deadline
//! dropping the in-flight future) releases the decoder and its files.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use shotline_models::{ImageAsset, VideoAsset};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::get_duration;

/// Distance from the end of the clip to seek to, in seconds.
pub const SEEK_EPSILON_SECS: f64 = 0.1;
/// Deadline for one extraction.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(10);
/// JPEG quality of the extracted still (0.0 - 1.0).
pub const DEFAULT_FRAME_QUALITY: f32 = 0.9;

const EXTRACT_TOTAL: &str = "shotline_frame_extract_total";
const EXTRACT_SECONDS: &str = "shotline_frame_extract_seconds";

/// Decodes the final frame of a clip into a still.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Return the last decodable frame of `video` as an image.
    async fn extract_last_frame(&self, video: &VideoAsset) -> MediaResult<ImageAsset>;
}

/// Seek position for the last frame: `duration - epsilon`, clamped at zero.
pub fn last_frame_seek(duration_secs: f64, epsilon_secs: f64) -> f64 {
    if !duration_secs.is_finite() {
        return 0.0;
    }
    (duration_secs - epsilon_secs).max(0.0)
}

/// FFmpeg-backed [`FrameExtractor`].
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    timeout: Duration,
    epsilon_secs: f64,
    quality: f32,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
            epsilon_secs: SEEK_EPSILON_SECS,
            quality: DEFAULT_FRAME_QUALITY,
        }
    }
}

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extraction deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output JPEG quality (0.0 - 1.0).
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality.clamp(0.01, 1.0);
        self
    }

    async fn extract_inner(&self, source: &str) -> MediaResult<ImageAsset> {
        let duration = get_duration(source).await?;
        let seek = last_frame_seek(duration, self.epsilon_secs);

        let scratch = tempfile::Builder::new().prefix("shotline-frame-").tempdir()?;
        let frame_path = scratch.path().join("last.png");

        let cmd = FfmpegCommand::new(source, &frame_path)
            .seek(seek)
            .single_frame();
        FfmpegRunner::new().run(&cmd).await?;

        // A seek that lands past the final decodable frame yields no output;
        // fall back to decoding the tail and keeping the last frame written.
        if !has_output(&frame_path).await {
            debug!(seek, "No frame at seek position, decoding tail of clip");
            let tail = FfmpegCommand::new(source, &frame_path)
                .seek_from_end(1.0)
                .update_single_image();
            FfmpegRunner::new().run(&tail).await?;
        }

        if !has_output(&frame_path).await {
            return Err(MediaError::extraction_failed(format!(
                "no frame decoded near {:.3}s",
                seek
            )));
        }

        let png = tokio::fs::read(&frame_path).await?;
        let quality = self.quality;
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&png, quality))
            .await
            .map_err(|e| MediaError::internal(format!("encode task failed: {}", e)))??;

        Ok(ImageAsset::new(jpeg, "image/jpeg"))
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_last_frame(&self, video: &VideoAsset) -> MediaResult<ImageAsset> {
        let source = match video.local_path() {
            Some(path) => path.to_string_lossy().to_string(),
            None => video.uri.clone(),
        };
        let started = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.extract_inner(&source)).await {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(e @ MediaError::ExtractionFailed(_))) => Err(e),
            Ok(Err(e)) => Err(MediaError::extraction_failed(e.to_string())),
            Err(_) => Err(MediaError::ExtractionTimeout {
                seconds: self.timeout.as_secs(),
            }),
        };

        let outcome = match &result {
            Ok(frame) => {
                info!(source = %source, bytes = frame.len(), "Extracted last frame");
                "ok"
            }
            Err(MediaError::ExtractionTimeout { .. }) => {
                warn!(source = %source, "Last-frame extraction timed out");
                "timeout"
            }
            Err(e) => {
                warn!(source = %source, "Last-frame extraction failed: {}", e);
                "failed"
            }
        };
        counter!(EXTRACT_TOTAL, "outcome" => outcome).increment(1);
        histogram!(EXTRACT_SECONDS).record(started.elapsed().as_secs_f64());

        result
    }
}

async fn has_output(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}

fn encode_jpeg(data: &[u8], quality: f32) -> MediaResult<Vec<u8>> {
    let rgb = image::load_from_memory(data)?.to_rgb8();
    let mut buf = Vec::new();
    let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    JpegEncoder::new_with_quality(&mut buf, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(buf)
}
