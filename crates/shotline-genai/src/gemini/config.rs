//! Gemini client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GenAiError, GenAiResult};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.0-generate-001";

/// Gemini client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Scheme and host of the API, without a trailing path
    pub base_url: String,
    /// Model for analysis, splitting and prompt writing
    pub text_model: String,
    /// Imagen model for first frames
    pub image_model: String,
    /// Veo model for clips
    pub video_model: String,
    /// Delay between polls of a video operation
    pub poll_interval: Duration,
    /// Bound on total polling time; `None` polls until the operation finishes
    pub max_poll_duration: Option<Duration>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Directory finished clips are downloaded into
    pub work_dir: PathBuf,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_duration", &self.max_poll_duration)
            .field("request_timeout", &self.request_timeout)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_interval: Duration::from_secs(8),
            max_poll_duration: Some(Duration::from_secs(600)),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            work_dir: PathBuf::from("/tmp/shotline"),
        }
    }
}

impl GeminiConfig {
    /// Config with the given key and default everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenAiError::config_error("GEMINI_API_KEY not set"))?;
        if api_key.trim().is_empty() {
            return Err(GenAiError::config_error("GEMINI_API_KEY cannot be empty"));
        }

        let defaults = Self::default();
        let max_poll_secs: u64 = std::env::var("GEMINI_MAX_POLL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            video_model: std::env::var("GEMINI_VIDEO_MODEL").unwrap_or(defaults.video_model),
            poll_interval: Duration::from_secs(
                std::env::var("GEMINI_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
            ),
            max_poll_duration: (max_poll_secs > 0).then(|| Duration::from_secs(max_poll_secs)),
            request_timeout: Duration::from_secs(
                std::env::var("GEMINI_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            connect_timeout: defaults.connect_timeout,
            work_dir: std::env::var("SHOTLINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
        })
    }

    /// Point the client at another host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self.max_poll_duration = max;
        self
    }

    pub(crate) fn api_root(&self) -> String {
        format!("{}/v1beta", self.base_url.trim_end_matches('/'))
    }
}
