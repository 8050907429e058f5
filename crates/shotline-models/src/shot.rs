//! Shot definitions and the per-slot generation state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{AspectRatio, ImageAsset, PromptTriple, VideoAsset};

/// Placeholder text for a manually added shot.
pub const NEW_SHOT_SEGMENT: &str = "New shot";
/// Placeholder video prompt for a manually added shot.
pub const NEW_SHOT_VIDEO_PROMPT: &str = "Describe the motion for this shot.";

/// Unique identifier for a shot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ShotId(pub String);

impl ShotId {
    /// Generate a new random shot ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation state of one asset slot of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A request is in flight
    Generating,
    /// The last request produced an asset
    Completed,
    /// The last request failed
    Error,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Generating => "generating",
            GenerationState::Completed => "completed",
            GenerationState::Error => "error",
        }
    }

    /// Legal moves: any settled state may start a (re)generation, and only a
    /// generating slot may settle.
    pub fn can_transition_to(&self, next: GenerationState) -> bool {
        match (self, next) {
            (GenerationState::Generating, GenerationState::Generating) => false,
            (_, GenerationState::Generating) => true,
            (GenerationState::Generating, GenerationState::Completed | GenerationState::Error) => {
                true
            }
            _ => false,
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, GenerationState::Generating)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two independently generated slots of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Image,
    Video,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Image => write!(f, "image"),
            Slot::Video => write!(f, "video"),
        }
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal {slot} transition {from} -> {to}")]
pub struct TransitionError {
    pub slot: Slot,
    pub from: GenerationState,
    pub to: GenerationState,
}

/// One unit of the storyboard.
///
/// Content fields are public; state and error fields only change through the
/// transition methods so the state machine cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// Unique shot ID, stable for the shot's lifetime
    pub id: ShotId,

    /// Source script text driving this shot
    pub script_segment: String,

    /// Prompt for the video generator
    pub video_prompt: String,

    /// Prompt for the first-frame image generator (generated lazily)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,

    /// Still first frame (uploaded, generated or inherited via continuity)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_frame: Option<ImageAsset>,

    /// Finished clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAsset>,

    image_state: GenerationState,
    video_state: GenerationState,

    #[serde(skip_serializing_if = "Option::is_none")]
    image_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    video_error: Option<String>,

    /// Aspect ratio recorded when generation was last requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_aspect_ratio: Option<AspectRatio>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Shot {
    /// Create an idle shot from a generated prompt triple.
    pub fn from_prompts(prompts: PromptTriple) -> Self {
        Self {
            id: ShotId::new(),
            script_segment: prompts.segment,
            video_prompt: prompts.video_prompt,
            image_prompt: prompts.image_prompt,
            start_frame: None,
            video: None,
            image_state: GenerationState::Idle,
            video_state: GenerationState::Idle,
            image_error: None,
            video_error: None,
            target_aspect_ratio: None,
            created_at: Utc::now(),
        }
    }

    /// Create a bare, manually added shot with placeholder text.
    pub fn placeholder() -> Self {
        Self::from_prompts(PromptTriple::new(NEW_SHOT_SEGMENT, NEW_SHOT_VIDEO_PROMPT, None))
    }

    pub fn image_state(&self) -> GenerationState {
        self.image_state
    }

    pub fn video_state(&self) -> GenerationState {
        self.video_state
    }

    /// Error message of the image slot; present only in the `Error` state.
    pub fn image_error(&self) -> Option<&str> {
        self.image_error.as_deref()
    }

    /// Error message of the video slot; present only in the `Error` state.
    pub fn video_error(&self) -> Option<&str> {
        self.video_error.as_deref()
    }

    pub fn state(&self, slot: Slot) -> GenerationState {
        match slot {
            Slot::Image => self.image_state,
            Slot::Video => self.video_state,
        }
    }

    pub fn has_start_frame(&self) -> bool {
        self.start_frame.is_some()
    }

    fn transition(&mut self, slot: Slot, to: GenerationState) -> Result<(), TransitionError> {
        let from = self.state(slot);
        if !from.can_transition_to(to) {
            return Err(TransitionError { slot, from, to });
        }
        let (state, error) = match slot {
            Slot::Image => (&mut self.image_state, &mut self.image_error),
            Slot::Video => (&mut self.video_state, &mut self.video_error),
        };
        *state = to;
        if to != GenerationState::Error {
            *error = None;
        }
        Ok(())
    }

    /// Start (or restart) generation of a slot.
    pub fn begin(&mut self, slot: Slot) -> Result<(), TransitionError> {
        self.transition(slot, GenerationState::Generating)
    }

    /// Settle a generating slot as failed, keeping any prior asset.
    pub fn fail(&mut self, slot: Slot, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(slot, GenerationState::Error)?;
        let message = Some(message.into());
        match slot {
            Slot::Image => self.image_error = message,
            Slot::Video => self.video_error = message,
        }
        Ok(())
    }

    /// Settle a generating image slot with a new first frame.
    pub fn complete_image(&mut self, frame: ImageAsset) -> Result<(), TransitionError> {
        self.transition(Slot::Image, GenerationState::Completed)?;
        self.start_frame = Some(frame);
        Ok(())
    }

    /// Settle a generating video slot with a finished clip.
    pub fn complete_video(&mut self, video: VideoAsset) -> Result<(), TransitionError> {
        self.transition(Slot::Video, GenerationState::Completed)?;
        self.video = Some(video);
        Ok(())
    }

    /// Replace the start frame with a user-supplied still.
    ///
    /// Always overwrites. A settled image slot is marked completed; a slot
    /// that is mid-generation keeps its state.
    pub fn upload_start_frame(&mut self, frame: ImageAsset) {
        if !self.image_state.is_generating() {
            self.image_state = GenerationState::Completed;
            self.image_error = None;
        }
        self.start_frame = Some(frame);
    }

    /// Write a frame inherited from the previous shot's clip.
    ///
    /// First writer wins: returns `false` and leaves the shot untouched when a
    /// start frame is already present. A settled image slot is marked
    /// completed; a slot that is mid-generation keeps its state so the
    /// in-flight request settles it.
    pub fn inherit_start_frame(&mut self, frame: ImageAsset) -> bool {
        if self.start_frame.is_some() {
            return false;
        }
        if !self.image_state.is_generating() {
            // Settled -> Generating -> Completed in one step.
            self.image_state = GenerationState::Completed;
            self.image_error = None;
        }
        self.start_frame = Some(frame);
        true
    }
}
