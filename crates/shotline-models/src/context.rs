//! Shared generation context passed to every collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::{AspectRatio, ImageAsset};

/// Upper bound on the total running time of a continuous edit, in seconds.
pub const MAX_STORYBOARD_SECONDS: u32 = 24;

/// Default target length of a single shot, in seconds.
pub const DEFAULT_SHOT_DURATION_SECS: u32 = 8;

/// How a script is turned into shots and whether continuity propagation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoryboardMode {
    /// Whole script in one prompt request; shots are independent
    #[default]
    Storyboard,
    /// Duration-bounded segments; last frame of each clip seeds the next shot
    Continuous,
}

impl StoryboardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryboardMode::Storyboard => "storyboard",
            StoryboardMode::Continuous => "continuous",
        }
    }

    /// Whether finished clips propagate their last frame to the next shot.
    pub fn propagates_continuity(&self) -> bool {
        matches!(self, StoryboardMode::Continuous)
    }
}

impl fmt::Display for StoryboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StoryboardMode {
    type Err = StoryboardModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "storyboard" => Ok(StoryboardMode::Storyboard),
            "continuous" => Ok(StoryboardMode::Continuous),
            _ => Err(StoryboardModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown storyboard mode: {0}")]
pub struct StoryboardModeParseError(String);

/// Style, era and framing settings shared by every request of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerationContext {
    /// Visual style (e.g. "cinematic", "anime", "documentary")
    #[validate(length(min = 1, max = 200))]
    pub style: String,

    /// Historical era or period setting
    #[validate(length(max = 200))]
    #[serde(default)]
    pub era: String,

    /// Ethnicity hint for depicted characters
    #[validate(length(max = 200))]
    #[serde(default)]
    pub ethnicity: String,

    /// Target aspect ratio for new generations
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Target length of each shot in seconds
    #[validate(range(min = 1, max = 24))]
    #[serde(default = "default_shot_duration")]
    pub shot_duration_secs: u32,

    /// Optional visual reference for character/look consistency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<ImageAsset>,
}

fn default_shot_duration() -> u32 {
    DEFAULT_SHOT_DURATION_SECS
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self {
            style: "cinematic".to_string(),
            era: String::new(),
            ethnicity: String::new(),
            aspect_ratio: AspectRatio::default(),
            shot_duration_secs: DEFAULT_SHOT_DURATION_SECS,
            reference_image: None,
        }
    }
}

impl GenerationContext {
    /// Maximum number of segments a script may be split into:
    /// `floor(24 / shot_duration_secs)`, never less than one.
    pub fn max_segments(&self) -> usize {
        (MAX_STORYBOARD_SECONDS / self.shot_duration_secs.max(1)).max(1) as usize
    }

    /// One-line summary used to reinforce style in generation prompts.
    pub fn style_summary(&self) -> String {
        let mut parts = vec![format!("Style: {}", self.style)];
        if !self.era.trim().is_empty() {
            parts.push(format!("Era: {}", self.era.trim()));
        }
        if !self.ethnicity.trim().is_empty() {
            parts.push(format!("Characters: {}", self.ethnicity.trim()));
        }
        parts.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_segments() {
        let mut ctx = GenerationContext::default();
        ctx.shot_duration_secs = 8;
        assert_eq!(ctx.max_segments(), 3);
        ctx.shot_duration_secs = 5;
        assert_eq!(ctx.max_segments(), 4);
        ctx.shot_duration_secs = 24;
        assert_eq!(ctx.max_segments(), 1);
        ctx.shot_duration_secs = 0;
        assert_eq!(ctx.max_segments(), 24);
    }

    #[test]
    fn test_context_validation() {
        let ctx = GenerationContext::default();
        assert!(ctx.validate().is_ok());

        let bad = GenerationContext {
            shot_duration_secs: 30,
            ..GenerationContext::default()
        };
        assert!(bad.validate().is_err());

        let empty_style = GenerationContext {
            style: String::new(),
            ..GenerationContext::default()
        };
        assert!(empty_style.validate().is_err());
    }

    #[test]
    fn test_style_summary_skips_blank_fields() {
        let ctx = GenerationContext {
            style: "noir".to_string(),
            era: "1940s".to_string(),
            ..GenerationContext::default()
        };
        assert_eq!(ctx.style_summary(), "Style: noir. Era: 1940s");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Continuous".parse::<StoryboardMode>().unwrap(), StoryboardMode::Continuous);
        assert!(StoryboardMode::Continuous.propagates_continuity());
        assert!(!StoryboardMode::Storyboard.propagates_continuity());
        assert!("loop".parse::<StoryboardMode>().is_err());
    }
}
