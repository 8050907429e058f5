//! Media helpers for the storyboard pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a kill-on-drop runner
//! - FFprobe metadata for local files and remote URLs
//! - `AssetCompressor`: bounded-size JPEG re-encoding before upload
//! - `FrameExtractor`: last-frame extraction for shot continuity

pub mod command;
pub mod compress;
pub mod error;
pub mod frame;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compress::{scaled_dimensions, AssetCompressor};
pub use error::{MediaError, MediaResult};
pub use frame::{last_frame_seek, FfmpegFrameExtractor, FrameExtractor};
pub use probe::{get_duration, probe_video, VideoInfo};
