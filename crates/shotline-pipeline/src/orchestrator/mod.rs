//! Shot orchestration.
//!
//! [`ShotOrchestrator`] exclusively owns the storyboard. Callers request
//! operations; every applied mutation bumps the storyboard version and the
//! operation returns the resulting snapshot.
//!
//! The storyboard lock is only held for short synchronous sections and never
//! across a remote call. Anything read before an await is re-validated when
//! the result is written back.

mod continuity;
mod editing;
mod generation;
mod script;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use validator::Validate;

use shotline_genai::{
    FirstFramePromptGenerator, GeminiClient, ImageGenerator, PromptGenerator, PromptRefiner,
    ScriptAnalyzer, ScriptSplitter, VideoGenerator,
};
use shotline_media::{AssetCompressor, FrameExtractor};
use shotline_models::{GenerationContext, Shot, ShotId, Storyboard, StoryboardMode};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::retry::RetryExecutor;

/// Remote and media services the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub analyzer: Arc<dyn ScriptAnalyzer>,
    pub splitter: Arc<dyn ScriptSplitter>,
    pub prompts: Arc<dyn PromptGenerator>,
    pub first_frame: Arc<dyn FirstFramePromptGenerator>,
    pub refiner: Arc<dyn PromptRefiner>,
    pub images: Arc<dyn ImageGenerator>,
    pub videos: Arc<dyn VideoGenerator>,
    pub frames: Arc<dyn FrameExtractor>,
}

impl Collaborators {
    /// Every generative collaborator backed by one Gemini client.
    pub fn gemini(client: GeminiClient, frames: Arc<dyn FrameExtractor>) -> Self {
        let client = Arc::new(client);
        Self {
            analyzer: client.clone(),
            splitter: client.clone(),
            prompts: client.clone(),
            first_frame: client.clone(),
            refiner: client.clone(),
            images: client.clone(),
            videos: client,
            frames,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

struct Inner {
    board: Mutex<Storyboard>,
    collaborators: Collaborators,
    retry: RetryExecutor,
    compressor: AssetCompressor,
    settle_delay: Duration,
}

/// Owner of one storyboard run.
///
/// Cheap to clone; clones share the same run, so independent shot operations
/// can be driven concurrently.
#[derive(Clone)]
pub struct ShotOrchestrator {
    inner: Arc<Inner>,
}

impl ShotOrchestrator {
    /// Create an orchestrator for an empty run.
    pub fn new(
        collaborators: Collaborators,
        config: &PipelineConfig,
        mode: StoryboardMode,
        context: GenerationContext,
    ) -> PipelineResult<Self> {
        validate_context(&context)?;
        Ok(Self {
            inner: Arc::new(Inner {
                board: Mutex::new(Storyboard::new(mode, context)),
                collaborators,
                retry: RetryExecutor::new(config.retry.clone()),
                compressor: config.compressor(),
                settle_delay: config.settle_delay,
            }),
        })
    }

    /// Current storyboard.
    pub fn snapshot(&self) -> Storyboard {
        self.lock().clone()
    }

    /// Current state of one shot.
    pub fn shot(&self, id: &ShotId) -> PipelineResult<Shot> {
        self.lock()
            .shot(id)
            .cloned()
            .ok_or_else(|| PipelineError::ShotNotFound(id.clone()))
    }

    /// Replace the shared generation context.
    ///
    /// Applies to requests started afterwards; in-flight requests keep the
    /// context they were started with.
    pub fn set_context(&self, context: GenerationContext) -> PipelineResult<Storyboard> {
        validate_context(&context)?;
        self.apply(|board| {
            board.context = context;
            Ok(())
        })
    }

    /// Switch between storyboard and continuous mode.
    pub fn set_mode(&self, mode: StoryboardMode) -> PipelineResult<Storyboard> {
        self.apply(|board| {
            board.mode = mode;
            Ok(())
        })
    }

    fn collaborators(&self) -> &Collaborators {
        &self.inner.collaborators
    }

    fn retry(&self) -> &RetryExecutor {
        &self.inner.retry
    }

    fn lock(&self) -> MutexGuard<'_, Storyboard> {
        // Shot transitions are atomic, so a poisoned board is still consistent.
        self.inner.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply one mutation and return the new snapshot. Nothing is bumped
    /// when `f` fails.
    fn apply<F>(&self, f: F) -> PipelineResult<Storyboard>
    where
        F: FnOnce(&mut Storyboard) -> PipelineResult<()>,
    {
        let mut board = self.lock();
        f(&mut board)?;
        board.bump_version();
        Ok(board.clone())
    }

    /// Apply one mutation to a single shot.
    fn apply_to_shot<F>(&self, id: &ShotId, f: F) -> PipelineResult<Storyboard>
    where
        F: FnOnce(&mut Shot) -> PipelineResult<()>,
    {
        self.apply(|board| {
            let shot = board
                .shot_mut(id)
                .ok_or_else(|| PipelineError::ShotNotFound(id.clone()))?;
            f(shot)
        })
    }

    /// Context as sent to remote services: the reference image, if any, is
    /// compressed first.
    async fn outbound_context(&self, mut context: GenerationContext) -> GenerationContext {
        if let Some(reference) = context.reference_image.take() {
            context.reference_image = Some(self.inner.compressor.compress_async(reference).await);
        }
        context
    }
}

impl std::fmt::Debug for ShotOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let board = self.lock();
        f.debug_struct("ShotOrchestrator")
            .field("version", &board.version())
            .field("mode", &board.mode)
            .field("shots", &board.len())
            .finish()
    }
}

fn validate_context(context: &GenerationContext) -> PipelineResult<()> {
    context
        .validate()
        .map_err(|e| PipelineError::invalid_context(e.to_string()))
}
