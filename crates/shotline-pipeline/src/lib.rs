//! Shot generation pipeline.
//!
//! This crate provides:
//! - `ShotOrchestrator`: owns the storyboard, drives per-shot image/video
//!   state machines and continuity propagation
//! - Script-to-shots construction in storyboard and continuous mode
//! - `RetryExecutor`: bounded exponential backoff for remote calls
//! - Environment-driven configuration, structured shot logging and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod retry;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::ShotLogger;
pub use orchestrator::{Collaborators, ShotOrchestrator};
pub use retry::{RetryClass, RetryExecutor, RetryPolicy, Retryable};
