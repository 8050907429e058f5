//! Generative collaborators for the Shotline pipeline.
//!
//! This crate provides:
//! - Collaborator traits for script analysis, splitting, prompt writing,
//!   prompt refinement, image generation and video generation
//! - A Gemini REST client implementing all of them (Imagen stills, Veo clips
//!   with operation polling and download)
//! - Error classification into retryable and terminal failures
//! - Discriminated response payloads and prompt templates

pub mod error;
pub mod gemini;
pub mod prompts;
pub mod response;
pub mod segments;
pub mod traits;

pub use error::{GenAiError, GenAiResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use response::{ImageOutcome, PollOutcome, TextOutcome, VideoPayload};
pub use segments::bound_segments;
pub use traits::{
    FirstFramePromptGenerator, ImageGenerator, PromptGenerator, PromptRefiner, ScriptAnalyzer,
    ScriptSplitter, StoryboardRequest, VideoGenerator, VideoRequest,
};
