//! Collaborator contracts consumed by the orchestrator.
//!
//! Every method is one remote call; retrying is the caller's concern. The
//! context's `reference_image` is sent as-is, so callers compress it first.

use async_trait::async_trait;

use shotline_models::{
    AspectRatio, GenerationContext, ImageAsset, PromptMode, PromptTriple, ScriptAnalysis,
    VideoAsset,
};

use crate::error::GenAiResult;

/// Structured deep analysis of a script.
#[async_trait]
pub trait ScriptAnalyzer: Send + Sync {
    /// Fails with `MalformedResponse` when the reply cannot be parsed.
    async fn analyze_script(&self, script: &str) -> GenAiResult<ScriptAnalysis>;
}

/// Splits a script into duration-bounded segments.
#[async_trait]
pub trait ScriptSplitter: Send + Sync {
    /// Ordered segment texts, at most `max_segments` long. An unparseable
    /// reply yields the whole script as a single segment.
    async fn split_script(
        &self,
        script: &str,
        shot_duration_secs: u32,
        max_segments: usize,
    ) -> GenAiResult<Vec<String>>;
}

/// Input of a storyboard-mode prompt request.
#[derive(Debug, Clone, Copy)]
pub struct StoryboardRequest<'a> {
    pub script: &'a str,
    pub context: &'a GenerationContext,
    pub analysis: Option<&'a ScriptAnalysis>,
}

/// Produces (segment, video prompt, image prompt) triples.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    /// One triple per shot the model chose to cut the script into.
    async fn storyboard_prompts(
        &self,
        request: StoryboardRequest<'_>,
    ) -> GenAiResult<Vec<PromptTriple>>;

    /// Exactly one triple per input segment, in input order. Missing entries
    /// are filled with [`PromptTriple::placeholder`].
    async fn batch_prompts(
        &self,
        segments: &[String],
        context: &GenerationContext,
    ) -> GenAiResult<Vec<PromptTriple>>;
}

/// Writes a still first-frame prompt for one segment.
#[async_trait]
pub trait FirstFramePromptGenerator: Send + Sync {
    /// Falls back to a templated prompt built from the same inputs.
    async fn first_frame_prompt(
        &self,
        segment: &str,
        context: &GenerationContext,
    ) -> GenAiResult<String>;
}

/// Rewrites a prompt following a free-text instruction.
#[async_trait]
pub trait PromptRefiner: Send + Sync {
    /// Falls back to returning `prompt` unchanged.
    async fn refine_prompt(
        &self,
        prompt: &str,
        instruction: &str,
        mode: PromptMode,
        context: &GenerationContext,
    ) -> GenAiResult<String>;
}

/// Renders a still image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Fails with `NoPayload` when the service returns no image.
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> GenAiResult<ImageAsset>;
}

/// Input of a video generation request.
#[derive(Debug, Clone, Copy)]
pub struct VideoRequest<'a> {
    pub prompt: &'a str,
    /// First frame to animate from
    pub start_frame: Option<&'a ImageAsset>,
    pub aspect_ratio: AspectRatio,
    /// Style and era reinforcement
    pub context: &'a GenerationContext,
}

/// Renders a clip, optionally animating a start frame.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Resolves once the remote job has finished; fails with `NoPayload`
    /// when it finished without a playable clip.
    async fn generate_video(&self, request: VideoRequest<'_>) -> GenAiResult<VideoAsset>;
}
