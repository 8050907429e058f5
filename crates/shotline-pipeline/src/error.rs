//! Pipeline error types.
//!
//! These are request-level errors returned to the caller of an orchestrator
//! operation. Remote failures during a shot's image or video generation are
//! not returned here; they are recorded on the shot itself.

use thiserror::Error;

use shotline_genai::GenAiError;
use shotline_media::MediaError;
use shotline_models::{ShotId, Slot, TransitionError};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Shot not found: {0}")]
    ShotNotFound(ShotId),

    #[error("Shot {shot_id} is already generating its {slot}")]
    AlreadyGenerating { shot_id: ShotId, slot: Slot },

    #[error("Script is empty")]
    EmptyScript,

    #[error("Invalid generation context: {0}")]
    InvalidContext(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenAiError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_context(msg: impl Into<String>) -> Self {
        Self::InvalidContext(msg.into())
    }

    pub(crate) fn from_transition(shot_id: &ShotId, err: TransitionError) -> Self {
        Self::AlreadyGenerating {
            shot_id: shot_id.clone(),
            slot: err.slot,
        }
    }

    /// Whether a later call could succeed without changing the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Generation(e) => e.is_retryable(),
            PipelineError::AlreadyGenerating { .. } => true,
            _ => false,
        }
    }
}
