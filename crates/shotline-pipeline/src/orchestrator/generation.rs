//! Per-shot first-frame and video generation.
//!
//! Each request moves its slot to `Generating` up front, runs the remote
//! calls without holding the storyboard lock, and settles the slot as
//! `Completed` or `Error`. Remote failures end up on the shot; only request
//! errors (unknown shot, slot already generating) are returned.

use std::time::Instant;

use tracing::Instrument;

use shotline_genai::{prompts, GenAiResult, VideoRequest};
use shotline_models::{
    GenerationContext, ImageAsset, Shot, ShotId, Slot, Storyboard, TransitionError, VideoAsset,
};

use super::ShotOrchestrator;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::ShotLogger;
use crate::metrics::{kinds, record_generation};

/// What a video request was started with.
struct VideoJob {
    prompt: String,
    start_frame: Option<ImageAsset>,
    context: GenerationContext,
}

impl ShotOrchestrator {
    /// Generate a still first frame for a shot.
    ///
    /// A missing image prompt is written first and kept on the shot.
    pub async fn produce_first_frame(&self, id: &ShotId) -> PipelineResult<Storyboard> {
        let logger = ShotLogger::for_slot(id, Slot::Image);
        let ((segment, image_prompt), context) = self.begin(id, Slot::Image, |shot, _| {
            (shot.script_segment.clone(), shot.image_prompt.clone())
        })?;
        logger.started(&format!("aspect {}", context.aspect_ratio));

        let started = Instant::now();
        let result = self
            .render_first_frame(id, &segment, image_prompt, &context, &logger)
            .instrument(logger.span())
            .await;
        record_generation(kinds::IMAGE, result.is_ok(), started.elapsed().as_secs_f64());

        self.settle(id, &logger, |shot| match result {
            Ok(frame) => shot.complete_image(frame),
            Err(e) => shot.fail(Slot::Image, e.to_string()),
        })
    }

    /// Generate a clip for a shot, animating its start frame when it has one.
    ///
    /// A non-blank `prompt_override` that differs from the stored prompt is
    /// saved on the shot before the request. In continuous mode a finished
    /// clip seeds the next shot's start frame.
    pub async fn produce_video(
        &self,
        id: &ShotId,
        prompt_override: Option<String>,
    ) -> PipelineResult<Storyboard> {
        let logger = ShotLogger::for_slot(id, Slot::Video);
        let ((prompt, start_frame), context) = self.begin(id, Slot::Video, |shot, _| {
            if let Some(prompt) = prompt_override.filter(|p| !p.trim().is_empty()) {
                if prompt != shot.video_prompt {
                    shot.video_prompt = prompt;
                }
            }
            (shot.video_prompt.clone(), shot.start_frame.clone())
        })?;
        let job = VideoJob {
            prompt,
            start_frame,
            context,
        };
        logger.started(&format!(
            "aspect {}, start frame: {}",
            job.context.aspect_ratio,
            job.start_frame.is_some()
        ));

        let started = Instant::now();
        let result = self
            .render_video(&job)
            .instrument(logger.span())
            .await;
        record_generation(kinds::VIDEO, result.is_ok(), started.elapsed().as_secs_f64());

        let finished = result.as_ref().ok().cloned();
        let board = self.settle(id, &logger, |shot| match result {
            Ok(video) => shot.complete_video(video),
            Err(e) => shot.fail(Slot::Video, e.to_string()),
        })?;

        match finished {
            Some(video) if board.mode.propagates_continuity() => {
                self.propagate_continuity(id, &video).await;
                Ok(self.snapshot())
            }
            _ => Ok(board),
        }
    }

    /// Move `slot` to `Generating`, record the target aspect ratio and read
    /// what the request needs, all under one lock.
    fn begin<T, F>(&self, id: &ShotId, slot: Slot, read: F) -> PipelineResult<(T, GenerationContext)>
    where
        F: FnOnce(&mut Shot, &GenerationContext) -> T,
    {
        let mut board = self.lock();
        let context = board.context.clone();
        let shot = board
            .shot_mut(id)
            .ok_or_else(|| PipelineError::ShotNotFound(id.clone()))?;
        shot.begin(slot)
            .map_err(|e| PipelineError::from_transition(id, e))?;
        shot.target_aspect_ratio = Some(context.aspect_ratio);
        let value = read(shot, &context);
        board.bump_version();
        Ok((value, context))
    }

    /// Write a request's outcome back onto the shot and log where the slot
    /// ended up.
    fn settle<F>(&self, id: &ShotId, logger: &ShotLogger, write: F) -> PipelineResult<Storyboard>
    where
        F: FnOnce(&mut Shot) -> Result<(), TransitionError>,
    {
        let result = self.apply_to_shot(id, |shot| {
            write(shot).map_err(|e| PipelineError::from_transition(id, e))?;
            logger.settled(shot);
            Ok(())
        });
        if let Err(PipelineError::ShotNotFound(_)) = &result {
            logger.warn("shot was replaced while generating, result dropped");
        }
        result
    }

    async fn render_first_frame(
        &self,
        id: &ShotId,
        segment: &str,
        image_prompt: Option<String>,
        context: &GenerationContext,
        logger: &ShotLogger,
    ) -> GenAiResult<ImageAsset> {
        let prompt = match image_prompt.filter(|p| !p.trim().is_empty()) {
            Some(prompt) => prompt,
            None => {
                let generated = self.write_first_frame_prompt(segment, context, logger).await;
                // Kept even if the image request below fails. A prompt the user
                // typed while this one was being written wins and is rendered.
                let mut prompt = generated.clone();
                let saved = self.apply_to_shot(id, |shot| {
                    match shot.image_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
                        Some(edited) => prompt = edited.to_string(),
                        None => shot.image_prompt = Some(generated),
                    }
                    Ok(())
                });
                if saved.is_err() {
                    logger.warn("shot disappeared before its image prompt was saved");
                }
                prompt
            }
        };

        self.retry()
            .execute("generate_image", || {
                self.collaborators()
                    .images
                    .generate_image(&prompt, context.aspect_ratio)
            })
            .await
    }

    async fn write_first_frame_prompt(
        &self,
        segment: &str,
        context: &GenerationContext,
        logger: &ShotLogger,
    ) -> String {
        let outbound = self.outbound_context(context.clone()).await;
        let result = self
            .retry()
            .execute("first_frame_prompt", || {
                self.collaborators()
                    .first_frame
                    .first_frame_prompt(segment, &outbound)
            })
            .await;

        match result {
            Ok(prompt) if !prompt.trim().is_empty() => prompt,
            Ok(_) => prompts::default_first_frame_prompt(segment, context),
            Err(e) => {
                logger.warn(&format!("first-frame prompt failed, using template: {}", e));
                prompts::default_first_frame_prompt(segment, context)
            }
        }
    }

    async fn render_video(&self, job: &VideoJob) -> GenAiResult<VideoAsset> {
        let start_frame = match &job.start_frame {
            Some(frame) => Some(self.inner.compressor.compress_async(frame.clone()).await),
            None => None,
        };
        let context = self.outbound_context(job.context.clone()).await;
        let request = VideoRequest {
            prompt: &job.prompt,
            start_frame: start_frame.as_ref(),
            aspect_ratio: context.aspect_ratio,
            context: &context,
        };

        self.retry()
            .execute("generate_video", || {
                self.collaborators().videos.generate_video(request)
            })
            .await
    }
}
