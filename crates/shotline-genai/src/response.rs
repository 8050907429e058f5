//! Wire types for the Gemini REST API and their discriminated outcomes.
//!
//! Raw responses are loosely shaped: a success body may carry no payload, a
//! block reason, or an embedded error. Each response type converts into an
//! outcome enum so callers match on every case explicitly.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use shotline_models::asset::{DEFAULT_IMAGE_MIME, DEFAULT_VIDEO_MIME};
use shotline_models::{ImageAsset, PromptTriple};

use crate::error::{GenAiError, GenAiResult};

// ---------------------------------------------------------------------------
// generateContent
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
}

impl GenerateContentRequest {
    /// Single-turn request with an optional attached image.
    pub fn new(prompt: &str, image: Option<&ImageAsset>, json: bool) -> Self {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        if let Some(image) = image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.to_base64(),
                },
            });
        }
        Self {
            contents: vec![Content { parts }],
            generation_config: json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Result of a text generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    Text(String),
    Blocked(String),
    Empty,
}

impl From<GenerateContentResponse> for TextOutcome {
    fn from(response: GenerateContentResponse) -> Self {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return TextOutcome::Blocked(reason);
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return TextOutcome::Empty;
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.trim().is_empty() {
            return TextOutcome::Text(text);
        }
        match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST")) => {
                TextOutcome::Blocked(reason.to_string())
            }
            _ => TextOutcome::Empty,
        }
    }
}

impl TextOutcome {
    pub fn into_text(self) -> GenAiResult<String> {
        match self {
            TextOutcome::Text(text) => Ok(text),
            TextOutcome::Blocked(reason) => Err(GenAiError::Blocked(reason)),
            TextOutcome::Empty => Err(GenAiError::no_payload("text")),
        }
    }
}

// ---------------------------------------------------------------------------
// Imagen :predict
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ImagePredictRequest {
    pub instances: Vec<ImageInstance>,
    pub parameters: ImageParameters,
}

#[derive(Debug, Serialize)]
pub struct ImageInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
pub struct ImagePredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

/// Result of an image generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Image(ImageAsset),
    Filtered(String),
    Empty,
}

impl ImagePredictResponse {
    pub fn into_outcome(self) -> GenAiResult<ImageOutcome> {
        let mut filtered = None;
        for prediction in self.predictions {
            if let Some(encoded) = prediction.bytes_base64_encoded {
                let mime = prediction
                    .mime_type
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                let asset = ImageAsset::from_base64(&encoded, mime)
                    .map_err(|e| GenAiError::malformed(format!("image payload: {}", e)))?;
                if !asset.is_empty() {
                    return Ok(ImageOutcome::Image(asset));
                }
            } else if filtered.is_none() {
                filtered = prediction.rai_filtered_reason;
            }
        }
        Ok(filtered.map_or(ImageOutcome::Empty, ImageOutcome::Filtered))
    }
}

// ---------------------------------------------------------------------------
// Veo :predictLongRunning
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VideoPredictRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub aspect_ratio: String,
}

/// Long-running operation handle and, once done, its result.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<SampleVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleVideo {
    uri: Option<String>,
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Where a finished clip can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPayload {
    Remote { uri: String, mime_type: String },
    Inline { data: Vec<u8>, mime_type: String },
}

/// State of a video operation after one poll.
#[derive(Debug)]
pub enum PollOutcome {
    Pending,
    Ready(VideoPayload),
    Failed(GenAiError),
    Filtered(String),
    Empty,
}

impl Operation {
    pub fn into_outcome(self) -> GenAiResult<PollOutcome> {
        if let Some(err) = self.error {
            return Ok(PollOutcome::Failed(GenAiError::from_rpc_status(
                err.code,
                err.status.as_deref(),
                &err.message,
            )));
        }
        if !self.done {
            return Ok(PollOutcome::Pending);
        }

        let Some(result) = self.response.and_then(|r| r.generate_video_response) else {
            return Ok(PollOutcome::Empty);
        };

        for video in result.generated_samples.into_iter().filter_map(|s| s.video) {
            let mime_type = video
                .mime_type
                .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());
            if let Some(uri) = video.uri.filter(|u| !u.is_empty()) {
                return Ok(PollOutcome::Ready(VideoPayload::Remote { uri, mime_type }));
            }
            if let Some(encoded) = video.bytes_base64_encoded {
                let data = STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| GenAiError::malformed(format!("video payload: {}", e)))?;
                return Ok(PollOutcome::Ready(VideoPayload::Inline { data, mime_type }));
            }
        }

        Ok(result
            .rai_media_filtered_reasons
            .into_iter()
            .next()
            .map_or(PollOutcome::Empty, PollOutcome::Filtered))
    }
}

// ---------------------------------------------------------------------------
// JSON replies embedded in model text
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SegmentsReply {
    Wrapped { segments: Vec<String> },
    Bare(Vec<String>),
}

impl SegmentsReply {
    pub fn into_segments(self) -> Vec<String> {
        match self {
            SegmentsReply::Wrapped { segments } | SegmentsReply::Bare(segments) => segments,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ShotsReply {
    Wrapped { shots: Vec<PromptTriple> },
    Bare(Vec<PromptTriple>),
}

impl ShotsReply {
    pub fn into_triples(self) -> Vec<PromptTriple> {
        match self {
            ShotsReply::Wrapped { shots } | ShotsReply::Bare(shots) => shots,
        }
    }
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse a JSON value out of model text, tolerating code fences.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> GenAiResult<T> {
    serde_json::from_str(strip_code_fence(text)).map_err(GenAiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_text_outcomes() {
        let ok: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"hel"},{"text":"lo"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(TextOutcome::from(ok), TextOutcome::Text("hello".to_string()));

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(matches!(
            TextOutcome::from(blocked).into_text(),
            Err(GenAiError::Blocked(_))
        ));

        let empty: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(matches!(
            TextOutcome::from(empty).into_text(),
            Err(GenAiError::NoPayload(_))
        ));
    }

    #[test]
    fn test_image_outcomes() {
        let ok: ImagePredictResponse = serde_json::from_str(
            r#"{"predictions":[{"bytesBase64Encoded":"AQID","mimeType":"image/png"}]}"#,
        )
        .unwrap();
        match ok.into_outcome().unwrap() {
            ImageOutcome::Image(asset) => assert_eq!(asset.data, vec![1, 2, 3]),
            other => panic!("unexpected: {other:?}"),
        }

        let filtered: ImagePredictResponse =
            serde_json::from_str(r#"{"predictions":[{"raiFilteredReason":"celebrity"}]}"#).unwrap();
        assert_eq!(
            filtered.into_outcome().unwrap(),
            ImageOutcome::Filtered("celebrity".to_string())
        );

        let empty: ImagePredictResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_outcome().unwrap(), ImageOutcome::Empty);

        let garbage: ImagePredictResponse =
            serde_json::from_str(r#"{"predictions":[{"bytesBase64Encoded":"!!"}]}"#).unwrap();
        assert!(matches!(
            garbage.into_outcome(),
            Err(GenAiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_operation_outcomes() {
        let pending: Operation = serde_json::from_str(r#"{"name":"operations/1"}"#).unwrap();
        assert!(matches!(pending.into_outcome().unwrap(), PollOutcome::Pending));

        let ready: Operation = serde_json::from_str(
            r#"{"name":"operations/1","done":true,"response":{"generateVideoResponse":
                {"generatedSamples":[{"video":{"uri":"https://files/v.mp4"}}]}}}"#,
        )
        .unwrap();
        match ready.into_outcome().unwrap() {
            PollOutcome::Ready(VideoPayload::Remote { uri, mime_type }) => {
                assert_eq!(uri, "https://files/v.mp4");
                assert_eq!(mime_type, "video/mp4");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let failed: Operation = serde_json::from_str(
            r#"{"name":"operations/1","done":true,"error":{"code":8,"message":"quota exceeded"}}"#,
        )
        .unwrap();
        match failed.into_outcome().unwrap() {
            PollOutcome::Failed(err) => assert!(err.is_rate_limited()),
            other => panic!("unexpected: {other:?}"),
        }

        let filtered: Operation = serde_json::from_str(
            r#"{"name":"operations/1","done":true,"response":{"generateVideoResponse":
                {"raiMediaFilteredReasons":["unsafe"]}}}"#,
        )
        .unwrap();
        assert!(matches!(filtered.into_outcome().unwrap(), PollOutcome::Filtered(_)));

        let empty: Operation =
            serde_json::from_str(r#"{"name":"operations/1","done":true}"#).unwrap();
        assert!(matches!(empty.into_outcome().unwrap(), PollOutcome::Empty));
    }

    #[test]
    fn test_reply_shapes() {
        let wrapped: SegmentsReply = parse_json(r#"{"segments":["a","b"]}"#).unwrap();
        assert_eq!(wrapped.into_segments(), vec!["a", "b"]);
        let bare: SegmentsReply = parse_json("```json\n[\"a\"]\n```").unwrap();
        assert_eq!(bare.into_segments(), vec!["a"]);

        let shots: ShotsReply =
            parse_json(r#"[{"segment":"s","videoPrompt":"v","imagePrompt":"i"}]"#).unwrap();
        assert_eq!(shots.into_triples()[0].video_prompt, "v");

        assert!(parse_json::<ShotsReply>("not json").is_err());
    }
}
