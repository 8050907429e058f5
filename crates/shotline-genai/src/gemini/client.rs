//! Gemini REST client.
//!
//! One client implements every collaborator trait: text models for analysis,
//! splitting and prompt writing, Imagen for stills, and Veo for clips. Veo
//! runs as a long-running operation that is polled until it finishes, then
//! the clip is downloaded into the work directory.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use shotline_models::{
    AspectRatio, GenerationContext, ImageAsset, PromptMode, PromptTriple, ScriptAnalysis,
    VideoAsset,
};

use super::config::GeminiConfig;
use crate::error::{GenAiError, GenAiResult};
use crate::prompts;
use crate::response::{
    parse_json, GenerateContentRequest, GenerateContentResponse, ImageInstance, ImageOutcome,
    ImageParameters, ImagePredictRequest, ImagePredictResponse, InlineImage, Operation,
    PollOutcome, SegmentsReply, ShotsReply, TextOutcome, VideoInstance, VideoParameters,
    VideoPayload, VideoPredictRequest,
};
use crate::segments::bound_segments;
use crate::traits::{
    FirstFramePromptGenerator, ImageGenerator, PromptGenerator, PromptRefiner, ScriptAnalyzer,
    ScriptSplitter, StoryboardRequest, VideoGenerator, VideoRequest,
};

const REQUESTS_TOTAL: &str = "shotline_genai_requests_total";
const LATENCY_SECONDS: &str = "shotline_genai_latency_seconds";

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("shotline-genai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenAiError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_root(), model, method)
    }

    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> GenAiResult<T>
    where
        F: std::future::Future<Output = GenAiResult<T>>,
    {
        let span = info_span!("gemini_request", operation = %operation);
        let start = Instant::now();
        let result = fut.instrument(span).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_rate_limited() => "rate_limited",
            Err(e) if e.is_transient() => "transient",
            Err(_) => "error",
        };
        counter!(REQUESTS_TOTAL, "operation" => operation.to_string(), "outcome" => outcome)
            .increment(1);
        histogram!(LATENCY_SECONDS, "operation" => operation.to_string())
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> GenAiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> GenAiResult<R> {
        let response = self
            .http
            .get(url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> GenAiResult<R> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenAiError::from_http_status(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(GenAiError::from)
    }

    /// Single-turn text generation.
    async fn generate_text(
        &self,
        prompt: &str,
        image: Option<&ImageAsset>,
        json: bool,
    ) -> GenAiResult<String> {
        let url = self.model_url(&self.config.text_model, "generateContent");
        let request = GenerateContentRequest::new(prompt, image, json);
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        TextOutcome::from(response).into_text()
    }

    async fn start_video(&self, request: &VideoRequest<'_>) -> GenAiResult<Operation> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let body = VideoPredictRequest {
            instances: vec![VideoInstance {
                prompt: prompts::reinforced_video_prompt(request.prompt, request.context),
                image: request.start_frame.map(|frame| InlineImage {
                    bytes_base64_encoded: frame.to_base64(),
                    mime_type: frame.mime_type.clone(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: video_aspect_ratio(request.aspect_ratio).to_string(),
            },
        };
        self.post_json(&url, &body).await
    }

    async fn poll_operation(&self, name: &str) -> GenAiResult<PollOutcome> {
        let url = format!("{}/{}", self.config.api_root(), name.trim_start_matches('/'));
        let operation: Operation = self.get_json(&url).await?;
        operation.into_outcome()
    }

    /// Poll a video operation until it settles or the polling bound is hit.
    ///
    /// A transient failure of one poll request does not fail the job; the
    /// next poll tries again.
    async fn wait_for_video(&self, operation: Operation) -> GenAiResult<VideoPayload> {
        let name = operation.name.clone();
        let started = tokio::time::Instant::now();
        let mut outcome = operation.into_outcome()?;
        let mut polls = 0u32;

        loop {
            match outcome {
                PollOutcome::Ready(payload) => {
                    info!(operation = %name, polls, "Video operation finished");
                    return Ok(payload);
                }
                PollOutcome::Failed(e) => return Err(e),
                PollOutcome::Filtered(reason) => return Err(GenAiError::Blocked(reason)),
                PollOutcome::Empty => return Err(GenAiError::no_payload("video")),
                PollOutcome::Pending => {}
            }

            if let Some(max) = self.config.max_poll_duration {
                if started.elapsed() >= max {
                    warn!(operation = %name, polls, "Video operation polling bound reached");
                    return Err(GenAiError::PollTimeout {
                        seconds: max.as_secs(),
                    });
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
            polls += 1;

            outcome = match self.poll_operation(&name).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_retryable() => {
                    warn!(operation = %name, polls, "Video poll failed, will poll again: {}", e);
                    PollOutcome::Pending
                }
                Err(e) => return Err(e),
            };
            debug!(operation = %name, polls, "Polled video operation");
        }
    }

    /// Materialize a finished clip as a local file.
    async fn store_video(&self, payload: VideoPayload) -> GenAiResult<VideoAsset> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;

        let (data, mime_type) = match payload {
            VideoPayload::Inline { data, mime_type } => (data, mime_type),
            VideoPayload::Remote { uri, mime_type } => {
                let mut request = self.http.get(&uri);
                // Only the API host gets the key.
                if uri.starts_with(self.config.base_url.trim_end_matches('/')) {
                    request = request.query(&[("key", self.config.api_key.as_str())]);
                }
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(GenAiError::from_http_status(status.as_u16(), &body));
                }
                (response.bytes().await?.to_vec(), mime_type)
            }
        };

        if data.is_empty() {
            return Err(GenAiError::no_payload("video"));
        }

        let path = self.clip_path(&mime_type);
        tokio::fs::write(&path, &data).await?;
        info!(path = %path.display(), bytes = data.len(), "Stored generated clip");

        Ok(VideoAsset::new(path.to_string_lossy(), mime_type))
    }

    fn clip_path(&self, mime_type: &str) -> PathBuf {
        let extension = match mime_type {
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ => "mp4",
        };
        self.config
            .work_dir
            .join(format!("clip-{}.{}", uuid::Uuid::new_v4(), extension))
    }
}

/// Veo accepts landscape 16:9 and portrait 9:16 only.
fn video_aspect_ratio(aspect: AspectRatio) -> AspectRatio {
    if aspect.is_vertical() {
        AspectRatio::PORTRAIT
    } else {
        AspectRatio::LANDSCAPE
    }
}

#[async_trait]
impl ScriptAnalyzer for GeminiClient {
    async fn analyze_script(&self, script: &str) -> GenAiResult<ScriptAnalysis> {
        self.execute_request("analyze_script", async {
            let text = self
                .generate_text(&prompts::analysis_prompt(script), None, true)
                .await?;
            parse_json::<ScriptAnalysis>(&text)
        })
        .await
    }
}

#[async_trait]
impl ScriptSplitter for GeminiClient {
    async fn split_script(
        &self,
        script: &str,
        shot_duration_secs: u32,
        max_segments: usize,
    ) -> GenAiResult<Vec<String>> {
        self.execute_request("split_script", async {
            let prompt = prompts::split_prompt(script, shot_duration_secs, max_segments);
            let text = self.generate_text(&prompt, None, true).await?;
            let segments = match parse_json::<SegmentsReply>(&text) {
                Ok(reply) => reply.into_segments(),
                Err(e) => {
                    warn!("Unparseable split reply, using whole script: {}", e);
                    Vec::new()
                }
            };
            Ok(bound_segments(segments, max_segments, script))
        })
        .await
    }
}

#[async_trait]
impl PromptGenerator for GeminiClient {
    async fn storyboard_prompts(
        &self,
        request: StoryboardRequest<'_>,
    ) -> GenAiResult<Vec<PromptTriple>> {
        self.execute_request("storyboard_prompts", async {
            let prompt =
                prompts::storyboard_prompt(request.script, request.context, request.analysis);
            let text = self
                .generate_text(&prompt, request.context.reference_image.as_ref(), true)
                .await?;
            let triples: Vec<PromptTriple> = parse_json::<ShotsReply>(&text)?
                .into_triples()
                .into_iter()
                .filter(|t| !t.segment.trim().is_empty() || !t.video_prompt.trim().is_empty())
                .collect();
            if triples.is_empty() {
                return Err(GenAiError::no_payload("shots"));
            }
            Ok(triples)
        })
        .await
    }

    async fn batch_prompts(
        &self,
        segments: &[String],
        context: &GenerationContext,
    ) -> GenAiResult<Vec<PromptTriple>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }
        self.execute_request("batch_prompts", async {
            let prompt = prompts::batch_prompt(segments, context);
            let text = self
                .generate_text(&prompt, context.reference_image.as_ref(), true)
                .await?;
            let returned = match parse_json::<ShotsReply>(&text) {
                Ok(reply) => reply.into_triples(),
                Err(e) => {
                    warn!(segments = segments.len(), "Unparseable batch reply: {}", e);
                    Vec::new()
                }
            };
            if returned.len() < segments.len() {
                warn!(
                    expected = segments.len(),
                    returned = returned.len(),
                    "Batch reply short, filling placeholders"
                );
            }
            Ok(PromptTriple::align_to_segments(segments, returned))
        })
        .await
    }
}

#[async_trait]
impl FirstFramePromptGenerator for GeminiClient {
    async fn first_frame_prompt(
        &self,
        segment: &str,
        context: &GenerationContext,
    ) -> GenAiResult<String> {
        self.execute_request("first_frame_prompt", async {
            let prompt = prompts::first_frame_prompt(segment, context);
            match self
                .generate_text(&prompt, context.reference_image.as_ref(), false)
                .await
            {
                Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
                Err(e) if e.is_retryable() => Err(e),
                Ok(_) => Ok(prompts::default_first_frame_prompt(segment, context)),
                Err(e) => {
                    warn!("First-frame prompt failed, using template: {}", e);
                    Ok(prompts::default_first_frame_prompt(segment, context))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl PromptRefiner for GeminiClient {
    async fn refine_prompt(
        &self,
        prompt: &str,
        instruction: &str,
        mode: PromptMode,
        context: &GenerationContext,
    ) -> GenAiResult<String> {
        self.execute_request("refine_prompt", async {
            let request = prompts::refine_prompt(prompt, instruction, mode, context);
            match self.generate_text(&request, None, false).await {
                Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
                Err(e) if e.is_retryable() => Err(e),
                Ok(_) => Ok(prompt.to_string()),
                Err(e) => {
                    warn!(mode = %mode, "Prompt refinement failed, keeping original: {}", e);
                    Ok(prompt.to_string())
                }
            }
        })
        .await
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> GenAiResult<ImageAsset> {
        self.execute_request("generate_image", async {
            let url = self.model_url(&self.config.image_model, "predict");
            let body = ImagePredictRequest {
                instances: vec![ImageInstance {
                    prompt: prompt.to_string(),
                }],
                parameters: ImageParameters {
                    sample_count: 1,
                    aspect_ratio: aspect_ratio.to_string(),
                },
            };
            let response: ImagePredictResponse = self.post_json(&url, &body).await?;
            match response.into_outcome()? {
                ImageOutcome::Image(asset) => Ok(asset),
                ImageOutcome::Filtered(reason) => Err(GenAiError::Blocked(reason)),
                ImageOutcome::Empty => Err(GenAiError::no_payload("image")),
            }
        })
        .await
    }
}

#[async_trait]
impl VideoGenerator for GeminiClient {
    async fn generate_video(&self, request: VideoRequest<'_>) -> GenAiResult<VideoAsset> {
        self.execute_request("generate_video", async {
            let operation = self.start_video(&request).await?;
            info!(
                operation = %operation.name,
                has_start_frame = request.start_frame.is_some(),
                "Started video operation"
            );
            let payload = self.wait_for_video(operation).await?;
            self.store_video(payload).await
        })
        .await
    }
}
