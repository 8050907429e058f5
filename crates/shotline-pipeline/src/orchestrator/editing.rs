//! Local shot edits and prompt refinement.
//!
//! Edits never touch generation state. Refinement is the only remote call
//! here and it only replaces the prompt draft.

use tracing::Instrument;

use shotline_models::{ImageAsset, PromptMode, Shot, ShotId, Storyboard};

use super::ShotOrchestrator;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::ShotLogger;

impl ShotOrchestrator {
    /// Append a bare placeholder shot to the end of the sequence.
    pub fn add_shot(&self) -> PipelineResult<(ShotId, Storyboard)> {
        let shot = Shot::placeholder();
        let id = shot.id.clone();
        let board = self.apply(|board| {
            board.push(shot);
            Ok(())
        })?;
        Ok((id, board))
    }

    pub fn edit_segment(&self, id: &ShotId, text: impl Into<String>) -> PipelineResult<Storyboard> {
        let text = text.into();
        self.apply_to_shot(id, |shot| {
            shot.script_segment = text;
            Ok(())
        })
    }

    pub fn edit_video_prompt(
        &self,
        id: &ShotId,
        prompt: impl Into<String>,
    ) -> PipelineResult<Storyboard> {
        let prompt = prompt.into();
        self.apply_to_shot(id, |shot| {
            shot.video_prompt = prompt;
            Ok(())
        })
    }

    /// Set the first-frame prompt. A blank prompt clears it, so the next
    /// first-frame request writes a fresh one.
    pub fn edit_image_prompt(
        &self,
        id: &ShotId,
        prompt: impl Into<String>,
    ) -> PipelineResult<Storyboard> {
        let prompt = prompt.into();
        self.apply_to_shot(id, |shot| {
            shot.image_prompt = Some(prompt).filter(|p| !p.trim().is_empty());
            Ok(())
        })
    }

    /// Replace a shot's start frame with a user-supplied still.
    ///
    /// Always overwrites, including a frame inherited from the previous shot.
    pub fn upload_start_frame(&self, id: &ShotId, frame: ImageAsset) -> PipelineResult<Storyboard> {
        let logger = ShotLogger::new(id, "upload_start_frame");
        let board = self.apply_to_shot(id, |shot| {
            shot.upload_start_frame(frame);
            Ok(())
        })?;
        logger.finished("start frame replaced");
        Ok(board)
    }

    /// Rewrite one of a shot's prompts following `instruction`.
    ///
    /// The current draft is kept when the refiner fails, so this only errors
    /// for an unknown shot.
    pub async fn refine_prompt(
        &self,
        id: &ShotId,
        mode: PromptMode,
        instruction: &str,
    ) -> PipelineResult<Storyboard> {
        let logger = ShotLogger::new(id, "refine_prompt");
        let (current, context) = {
            let board = self.lock();
            let shot = board
                .shot(id)
                .ok_or_else(|| PipelineError::ShotNotFound(id.clone()))?;
            let current = match mode {
                PromptMode::Video => shot.video_prompt.clone(),
                PromptMode::Image => shot.image_prompt.clone().unwrap_or_default(),
            };
            (current, board.context.clone())
        };
        logger.started(mode.as_str());

        let result = self
            .retry()
            .execute("refine_prompt", || {
                self.collaborators()
                    .refiner
                    .refine_prompt(&current, instruction, mode, &context)
            })
            .instrument(logger.span())
            .await;

        let refined = match result {
            Ok(refined) if !refined.trim().is_empty() => refined,
            Ok(_) => current.clone(),
            Err(e) => {
                logger.warn(&format!("refinement failed, keeping draft: {}", e));
                current.clone()
            }
        };

        // An edit made while the refiner was running wins over the rewrite.
        let mut replaced = false;
        let board = self.apply_to_shot(id, |shot| {
            let draft = match mode {
                PromptMode::Video => shot.video_prompt.clone(),
                PromptMode::Image => shot.image_prompt.clone().unwrap_or_default(),
            };
            if draft != current {
                return Ok(());
            }
            match mode {
                PromptMode::Video => shot.video_prompt = refined,
                PromptMode::Image => shot.image_prompt = Some(refined).filter(|p| !p.is_empty()),
            }
            replaced = true;
            Ok(())
        })?;
        if replaced {
            logger.finished(mode.as_str());
        } else {
            logger.warn("prompt was edited during refinement, keeping the edit");
        }
        Ok(board)
    }
}
