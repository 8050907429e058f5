//! Storyboard pipeline binary.
//!
//! Turns a script file into shots, then generates every first frame and clip
//! in order, writing `storyboard.json` and the frames to an output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shotline_genai::{GeminiClient, GeminiConfig};
use shotline_media::compress::guess_mime;
use shotline_media::{check_ffmpeg, FfmpegFrameExtractor};
use shotline_models::{GenerationState, ImageAsset, Storyboard};
use shotline_pipeline::config::{context_from_env, mode_from_env};
use shotline_pipeline::{Collaborators, PipelineConfig, ShotOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("shotline=info".parse()?)
        .add_directive("hyper=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let script_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SHOTLINE_SCRIPT").ok())
        .context("usage: shotline <script-file> (or set SHOTLINE_SCRIPT)")?;
    let script = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("reading script {}", script_path))?;

    let output_dir = PathBuf::from(
        std::env::var("SHOTLINE_OUTPUT_DIR").unwrap_or_else(|_| "shotline-output".to_string()),
    );
    tokio::fs::create_dir_all(&output_dir).await?;

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);
    tokio::fs::create_dir_all(&config.work_dir).await?;

    let mode = mode_from_env();
    if mode.propagates_continuity() && check_ffmpeg().is_err() {
        warn!("ffmpeg not found; continuity propagation will be skipped");
    }

    let gemini = GeminiConfig::from_env()?.with_work_dir(config.work_dir.clone());
    let client = GeminiClient::new(gemini)?;
    let frames = Arc::new(FfmpegFrameExtractor::new().with_timeout(config.extract_timeout));

    let mut context = context_from_env();
    if let Ok(path) = std::env::var("SHOTLINE_REFERENCE_IMAGE") {
        context.reference_image = Some(load_image(Path::new(&path)).await?);
    }

    let orchestrator = ShotOrchestrator::new(
        Collaborators::gemini(client, frames),
        &config,
        mode,
        context,
    )?;
    info!(mode = %mode, "Starting storyboard run");

    if env_flag("SHOTLINE_ANALYZE") {
        if let Err(e) = orchestrator.analyze_script(&script).await {
            warn!("Script analysis failed, continuing without it: {}", e);
        }
    }

    let board = orchestrator.script_to_shots(&script).await?;
    info!(shots = board.len(), "Storyboard built");

    let ids: Vec<_> = board.shots().iter().map(|s| s.id.clone()).collect();
    for (index, id) in ids.iter().enumerate() {
        info!(shot = index + 1, total = ids.len(), "Generating shot");
        if !orchestrator.shot(id)?.has_start_frame() {
            orchestrator.produce_first_frame(id).await?;
        }
        orchestrator.produce_video(id, None).await?;
    }

    let board = orchestrator.snapshot();
    write_report(&board, &output_dir).await?;

    let failed = board
        .shots()
        .iter()
        .filter(|s| {
            s.image_state() == GenerationState::Error || s.video_state() == GenerationState::Error
        })
        .count();
    if failed > 0 {
        error!(failed, total = board.len(), "Some shots failed");
        std::process::exit(1);
    }

    info!(output = %output_dir.display(), "Storyboard run complete");
    Ok(())
}

async fn load_image(path: &Path) -> anyhow::Result<ImageAsset> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading reference image {}", path.display()))?;
    let mime = guess_mime(&data).unwrap_or_else(|| "image/png".to_string());
    Ok(ImageAsset::new(data, mime))
}

async fn write_report(board: &Storyboard, output_dir: &Path) -> anyhow::Result<()> {
    for (index, shot) in board.shots().iter().enumerate() {
        if let Some(frame) = &shot.start_frame {
            let path = output_dir.join(format!("shot-{:02}.{}", index + 1, frame.extension()));
            tokio::fs::write(&path, &frame.data).await?;
        }
    }

    let json = serde_json::to_string_pretty(board)?;
    tokio::fs::write(output_dir.join("storyboard.json"), json).await?;
    Ok(())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
