//! Shared data models for the Shotline storyboard pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Shots and their independent image/video generation states
//! - Image and video assets moving through the pipeline
//! - Shared generation context (style, era, aspect ratio, shot duration)
//! - Prompt triples and script analysis returned by the text models
//! - The versioned storyboard run owned by the orchestrator

pub mod aspect;
pub mod asset;
pub mod context;
pub mod prompt;
pub mod shot;
pub mod storyboard;

// Re-export common types
pub use aspect::{AspectRatio, AspectRatioParseError};
pub use asset::{ImageAsset, VideoAsset};
pub use context::{GenerationContext, StoryboardMode, MAX_STORYBOARD_SECONDS};
pub use prompt::{PromptMode, PromptTriple, ScriptAnalysis, PROMPT_FAILURE_PLACEHOLDER};
pub use shot::{GenerationState, Shot, ShotId, Slot, TransitionError};
pub use storyboard::Storyboard;
