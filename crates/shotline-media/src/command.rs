//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
///
/// The input is kept as a string so both local paths and http(s) URLs work.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input path or URL
    input: String,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Seek relative to the end of the input (before input).
    pub fn seek_from_end(self, seconds: f64) -> Self {
        self.input_arg("-sseof")
            .input_arg(format!("-{:.3}", seconds.abs()))
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Keep overwriting one output image with every decoded frame, leaving
    /// the last one on disk.
    pub fn update_single_image(self) -> Self {
        self.output_arg("-update").output_arg("1")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite the output, report errors only.
        args.extend(["-y", "-v", "error"].map(String::from));

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.clone());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands.
///
/// The child process is spawned with `kill_on_drop`, so dropping the run
/// future (an outer timeout firing, a caller giving up) always reaps FFmpeg.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(status = ?output.status.code(), "FFmpeg failed");
        Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            (!stderr.is_empty()).then_some(stderr),
            output.status.code(),
        ))
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "frame.png")
            .seek(7.9)
            .single_frame();

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input, "seek must be an input option");
        assert_eq!(args[ss + 1], "7.900");
        assert!(args.contains(&"-frames:v".to_string()));
        assert_eq!(args.last().unwrap(), "frame.png");
    }

    #[test]
    fn test_seek_from_end_is_negative() {
        let args = FfmpegCommand::new("https://cdn.example.com/a.mp4", "out.png")
            .seek_from_end(1.0)
            .update_single_image()
            .build_args();
        let pos = args.iter().position(|a| a == "-sseof").unwrap();
        assert_eq!(args[pos + 1], "-1.000");
        assert!(args.contains(&"https://cdn.example.com/a.mp4".to_string()));
        assert!(args.contains(&"-update".to_string()));
    }
}
