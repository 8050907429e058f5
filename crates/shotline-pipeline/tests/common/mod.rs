//! In-memory collaborators for driving the orchestrator in tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use shotline_genai::{
    FirstFramePromptGenerator, GenAiError, GenAiResult, ImageGenerator, PromptGenerator,
    PromptRefiner, ScriptAnalyzer, ScriptSplitter, StoryboardRequest, VideoGenerator,
    VideoRequest,
};
use shotline_media::{FrameExtractor, MediaError, MediaResult};
use shotline_models::{
    AspectRatio, GenerationContext, ImageAsset, PromptMode, PromptTriple, ScriptAnalysis,
    StoryboardMode, VideoAsset,
};
use shotline_pipeline::{Collaborators, PipelineConfig, RetryPolicy, ShotOrchestrator};

/// Recorded video request.
#[derive(Debug, Clone)]
pub struct VideoCall {
    pub prompt: String,
    pub start_frame: Option<ImageAsset>,
    pub aspect_ratio: AspectRatio,
}

/// Scripted stand-in for every generative collaborator.
#[derive(Default)]
pub struct FakeGenAi {
    pub analysis: Mutex<ScriptAnalysis>,
    pub split_reply: Mutex<Vec<String>>,
    pub storyboard_reply: Mutex<Vec<PromptTriple>>,
    /// Answer at most this many batch entries
    pub batch_limit: Mutex<Option<usize>>,
    pub batch_malformed: AtomicBool,
    pub first_frame_fails: AtomicBool,
    pub refine_fails: AtomicBool,
    /// Image or video prompts containing this marker fail terminally
    pub fail_marker: Mutex<Option<String>>,
    /// Leading video attempts that fail with a rate-limit error
    pub rate_limited_videos: AtomicU32,
    /// Leading video attempts that fail with an unavailable error
    pub unavailable_videos: AtomicU32,
    /// Video requests wait for a permit when set
    pub video_gate: Mutex<Option<Arc<Notify>>>,
    /// First-frame prompt and refine requests wait for a permit when set
    pub prompt_gate: Mutex<Option<Arc<Notify>>>,

    pub analyzed: Mutex<Vec<String>>,
    pub storyboard_analysis: Mutex<Vec<Option<ScriptAnalysis>>>,
    pub batch_inputs: Mutex<Vec<Vec<String>>>,
    pub first_frame_calls: AtomicU32,
    pub refine_calls: AtomicU32,
    pub image_calls: Mutex<Vec<String>>,
    pub video_calls: Mutex<Vec<VideoCall>>,
    pub video_attempts: AtomicU32,
}

impl FakeGenAi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gate_videos(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.video_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_prompts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.prompt_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn wait_for_prompt_gate(&self) {
        let gate = self.prompt_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    pub fn fail_prompts_containing(&self, marker: &str) {
        *self.fail_marker.lock().unwrap() = Some(marker.to_string());
    }

    fn should_fail(&self, prompt: &str) -> bool {
        self.fail_marker
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|m| prompt.contains(m))
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ScriptAnalyzer for FakeGenAi {
    async fn analyze_script(&self, script: &str) -> GenAiResult<ScriptAnalysis> {
        self.analyzed.lock().unwrap().push(script.to_string());
        Ok(self.analysis.lock().unwrap().clone())
    }
}

#[async_trait]
impl ScriptSplitter for FakeGenAi {
    async fn split_script(
        &self,
        _script: &str,
        _shot_duration_secs: u32,
        _max_segments: usize,
    ) -> GenAiResult<Vec<String>> {
        Ok(self.split_reply.lock().unwrap().clone())
    }
}

#[async_trait]
impl PromptGenerator for FakeGenAi {
    async fn storyboard_prompts(
        &self,
        request: StoryboardRequest<'_>,
    ) -> GenAiResult<Vec<PromptTriple>> {
        self.storyboard_analysis
            .lock()
            .unwrap()
            .push(request.analysis.cloned());
        Ok(self.storyboard_reply.lock().unwrap().clone())
    }

    async fn batch_prompts(
        &self,
        segments: &[String],
        _context: &GenerationContext,
    ) -> GenAiResult<Vec<PromptTriple>> {
        self.batch_inputs.lock().unwrap().push(segments.to_vec());
        if self.batch_malformed.load(Ordering::SeqCst) {
            return Err(GenAiError::malformed("expected a JSON array"));
        }
        let limit = self.batch_limit.lock().unwrap().unwrap_or(segments.len());
        Ok(segments
            .iter()
            .take(limit)
            .map(|s| {
                PromptTriple::new(
                    s.clone(),
                    format!("video: {}", s),
                    Some(format!("image: {}", s)),
                )
            })
            .collect())
    }
}

#[async_trait]
impl FirstFramePromptGenerator for FakeGenAi {
    async fn first_frame_prompt(
        &self,
        segment: &str,
        _context: &GenerationContext,
    ) -> GenAiResult<String> {
        self.first_frame_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_prompt_gate().await;
        if self.first_frame_fails.load(Ordering::SeqCst) {
            return Err(GenAiError::Failed("text model refused".to_string()));
        }
        Ok(format!("still of {}", segment))
    }
}

#[async_trait]
impl PromptRefiner for FakeGenAi {
    async fn refine_prompt(
        &self,
        prompt: &str,
        instruction: &str,
        mode: PromptMode,
        _context: &GenerationContext,
    ) -> GenAiResult<String> {
        self.refine_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_prompt_gate().await;
        if self.refine_fails.load(Ordering::SeqCst) {
            return Err(GenAiError::Failed("refiner down".to_string()));
        }
        Ok(format!("{} ({} refined: {})", prompt, mode, instruction))
    }
}

#[async_trait]
impl ImageGenerator for FakeGenAi {
    async fn generate_image(
        &self,
        prompt: &str,
        _aspect_ratio: AspectRatio,
    ) -> GenAiResult<ImageAsset> {
        self.image_calls.lock().unwrap().push(prompt.to_string());
        if self.should_fail(prompt) {
            return Err(GenAiError::Blocked("safety filter".to_string()));
        }
        Ok(ImageAsset::new(prompt.as_bytes().to_vec(), "image/png"))
    }
}

#[async_trait]
impl VideoGenerator for FakeGenAi {
    async fn generate_video(&self, request: VideoRequest<'_>) -> GenAiResult<VideoAsset> {
        self.video_attempts.fetch_add(1, Ordering::SeqCst);
        let gate = self.video_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if take_one(&self.rate_limited_videos) {
            return Err(GenAiError::classify_message("quota exceeded"));
        }
        if take_one(&self.unavailable_videos) {
            return Err(GenAiError::Unavailable {
                status: Some(503),
                message: "overloaded".to_string(),
            });
        }
        self.video_calls.lock().unwrap().push(VideoCall {
            prompt: request.prompt.to_string(),
            start_frame: request.start_frame.cloned(),
            aspect_ratio: request.aspect_ratio,
        });
        if self.should_fail(request.prompt) {
            return Err(GenAiError::Failed("video rejected".to_string()));
        }
        let n = self.video_calls.lock().unwrap().len();
        Ok(VideoAsset::from_path(format!("/tmp/shotline-test/clip-{}.mp4", n)))
    }
}

/// How a fake extraction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Frame,
    Fail,
    Timeout,
}

/// Scripted [`FrameExtractor`].
pub struct FakeFrames {
    pub frame: ImageAsset,
    pub mode: Mutex<ExtractMode>,
    pub calls: AtomicU32,
    /// Extraction waits for a permit when set
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeFrames {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frame: extracted_frame(),
            mode: Mutex::new(ExtractMode::Frame),
            calls: AtomicU32::new(0),
            gate: Mutex::new(None),
        })
    }

    pub fn set_mode(&self, mode: ExtractMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl FrameExtractor for FakeFrames {
    async fn extract_last_frame(&self, _video: &VideoAsset) -> MediaResult<ImageAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mode = *self.mode.lock().unwrap();
        match mode {
            ExtractMode::Frame => Ok(self.frame.clone()),
            ExtractMode::Fail => Err(MediaError::extraction_failed("no frame decoded")),
            ExtractMode::Timeout => Err(MediaError::ExtractionTimeout { seconds: 10 }),
        }
    }
}

/// The still every fake extraction returns.
pub fn extracted_frame() -> ImageAsset {
    ImageAsset::new(b"last-frame".to_vec(), "image/jpeg")
}

/// A still a user would upload.
pub fn uploaded_frame() -> ImageAsset {
    ImageAsset::new(b"user-upload".to_vec(), "image/png")
}

/// Fast retries and no settle delay.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            rate_limit_base_delay: Duration::from_millis(1),
        },
        settle_delay: Duration::from_millis(1),
        ..PipelineConfig::default()
    }
}

pub fn collaborators(genai: &Arc<FakeGenAi>, frames: &Arc<FakeFrames>) -> Collaborators {
    Collaborators {
        analyzer: genai.clone(),
        splitter: genai.clone(),
        prompts: genai.clone(),
        first_frame: genai.clone(),
        refiner: genai.clone(),
        images: genai.clone(),
        videos: genai.clone(),
        frames: frames.clone(),
    }
}

pub fn orchestrator(
    genai: &Arc<FakeGenAi>,
    frames: &Arc<FakeFrames>,
    mode: StoryboardMode,
) -> ShotOrchestrator {
    orchestrator_with(genai, frames, mode, test_config())
}

pub fn orchestrator_with(
    genai: &Arc<FakeGenAi>,
    frames: &Arc<FakeFrames>,
    mode: StoryboardMode,
    config: PipelineConfig,
) -> ShotOrchestrator {
    ShotOrchestrator::new(
        collaborators(genai, frames),
        &config,
        mode,
        GenerationContext::default(),
    )
    .unwrap()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
