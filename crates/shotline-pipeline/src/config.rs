//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use shotline_media::AssetCompressor;
use shotline_models::{AspectRatio, GenerationContext, StoryboardMode};

use crate::retry::RetryPolicy;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Retry policy for every remote call
    pub retry: RetryPolicy,
    /// Wait between a finished clip and its last-frame extraction
    pub settle_delay: Duration,
    /// Deadline for one last-frame extraction
    pub extract_timeout: Duration,
    /// Bound on the longest side of images sent to remote models
    pub compress_max_dimension: u32,
    /// Lossy quality of images sent to remote models (0.0 - 1.0)
    pub compress_quality: f32,
    /// Work directory for downloaded clips and scratch files
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_millis(500),
            extract_timeout: Duration::from_secs(10),
            compress_max_dimension: 1024,
            compress_quality: 0.8,
            work_dir: PathBuf::from("/tmp/shotline"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: env_parse("SHOTLINE_RETRY_ATTEMPTS").unwrap_or(3),
                base_delay: Duration::from_millis(
                    env_parse("SHOTLINE_RETRY_BASE_MS").unwrap_or(2000),
                ),
                rate_limit_base_delay: Duration::from_millis(
                    env_parse("SHOTLINE_RATE_LIMIT_BASE_MS").unwrap_or(5000),
                ),
            },
            settle_delay: Duration::from_millis(env_parse("SHOTLINE_SETTLE_MS").unwrap_or(500)),
            extract_timeout: Duration::from_secs(
                env_parse("SHOTLINE_EXTRACT_TIMEOUT_SECS").unwrap_or(10),
            ),
            compress_max_dimension: env_parse("SHOTLINE_COMPRESS_MAX_DIM").unwrap_or(1024),
            compress_quality: env_parse("SHOTLINE_COMPRESS_QUALITY").unwrap_or(0.8),
            work_dir: std::env::var("SHOTLINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/shotline")),
        }
    }

    pub fn compressor(&self) -> AssetCompressor {
        AssetCompressor::new(self.compress_max_dimension, self.compress_quality)
    }
}

/// Initial storyboard mode from `SHOTLINE_MODE` (`storyboard` | `continuous`).
pub fn mode_from_env() -> StoryboardMode {
    std::env::var("SHOTLINE_MODE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Initial generation context from environment variables.
///
/// The reference image is not read here; binaries load it from
/// `SHOTLINE_REFERENCE_IMAGE` themselves.
pub fn context_from_env() -> GenerationContext {
    let defaults = GenerationContext::default();
    GenerationContext {
        style: std::env::var("SHOTLINE_STYLE").unwrap_or(defaults.style),
        era: std::env::var("SHOTLINE_ERA").unwrap_or(defaults.era),
        ethnicity: std::env::var("SHOTLINE_ETHNICITY").unwrap_or(defaults.ethnicity),
        aspect_ratio: env_parse::<AspectRatio>("SHOTLINE_ASPECT_RATIO")
            .unwrap_or(defaults.aspect_ratio),
        shot_duration_secs: env_parse("SHOTLINE_SHOT_DURATION_SECS")
            .unwrap_or(defaults.shot_duration_secs),
        reference_image: None,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
