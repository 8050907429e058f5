//! Prompt payloads exchanged with the text models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value written into a prompt slot when the batch generator returned no entry
/// for a segment, so that no shot is created without an observable prompt.
pub const PROMPT_FAILURE_PLACEHOLDER: &str = "[Prompt generation failed for this segment]";

/// One generated unit: a script segment with its video and first-frame prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PromptTriple {
    /// Source script text driving the shot
    pub segment: String,
    /// Full-motion prompt for the video generator
    #[serde(alias = "videoPrompt")]
    pub video_prompt: String,
    /// Still first-frame prompt for the image generator
    #[serde(default, alias = "imagePrompt", skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
}

impl PromptTriple {
    pub fn new(
        segment: impl Into<String>,
        video_prompt: impl Into<String>,
        image_prompt: Option<String>,
    ) -> Self {
        Self {
            segment: segment.into(),
            video_prompt: video_prompt.into(),
            image_prompt,
        }
    }

    /// Filler entry for a segment the generator did not answer.
    pub fn placeholder(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            video_prompt: PROMPT_FAILURE_PLACEHOLDER.to_string(),
            image_prompt: Some(PROMPT_FAILURE_PLACEHOLDER.to_string()),
        }
    }

    /// Whether this entry is a failure placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.video_prompt == PROMPT_FAILURE_PLACEHOLDER
    }

    /// Pair a batch response with the segments it answers.
    ///
    /// Entries are matched by position and the result always has exactly one
    /// entry per segment, in segment order: missing or blank entries become
    /// placeholders and surplus entries are dropped. The reviewed segment text
    /// is kept as the shot's source text.
    pub fn align_to_segments(segments: &[String], returned: Vec<PromptTriple>) -> Vec<PromptTriple> {
        let mut returned = returned.into_iter();
        segments
            .iter()
            .map(|segment| match returned.next() {
                Some(entry) if !entry.video_prompt.trim().is_empty() => PromptTriple {
                    segment: segment.clone(),
                    video_prompt: entry.video_prompt,
                    image_prompt: entry.image_prompt.filter(|p| !p.trim().is_empty()),
                },
                _ => PromptTriple::placeholder(segment.clone()),
            })
            .collect()
    }
}

/// Which prompt of a shot an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    Image,
    Video,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Image => "image",
            PromptMode::Video => "video",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured deep analysis of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptAnalysis {
    /// Overall pacing description
    #[serde(default)]
    pub pacing: String,
    /// Emotional tone
    #[serde(default)]
    pub tone: String,
    /// Characters with short visual descriptions
    #[serde(default)]
    pub characters: Vec<String>,
    /// Natural cut points in the script
    #[serde(default)]
    pub break_points: Vec<String>,
    /// Short summary of the story
    #[serde(default)]
    pub summary: String,
}

impl ScriptAnalysis {
    /// Render the analysis as prompt context.
    pub fn to_context(&self) -> String {
        let mut out = String::new();
        if !self.summary.is_empty() {
            out.push_str(&format!("Summary: {}\n", self.summary));
        }
        if !self.pacing.is_empty() {
            out.push_str(&format!("Pacing: {}\n", self.pacing));
        }
        if !self.tone.is_empty() {
            out.push_str(&format!("Tone: {}\n", self.tone));
        }
        if !self.characters.is_empty() {
            out.push_str(&format!("Characters: {}\n", self.characters.join("; ")));
        }
        if !self.break_points.is_empty() {
            out.push_str(&format!("Break points: {}\n", self.break_points.join("; ")));
        }
        out
    }
}
