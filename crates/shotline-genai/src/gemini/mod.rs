//! Gemini REST implementation of the collaborator traits.

mod client;
mod config;


pub use client::GeminiClient;
pub use config::{
    GeminiConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_VIDEO_MODEL,
};
