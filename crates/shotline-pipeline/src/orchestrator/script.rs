//! Script-to-shots construction.

use tracing::Instrument;

use shotline_genai::{bound_segments, StoryboardRequest};
use shotline_models::{PromptTriple, Shot, Storyboard, StoryboardMode};

use super::ShotOrchestrator;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::ShotLogger;

impl ShotOrchestrator {
    /// Run a deep analysis of `script` and keep it on the storyboard.
    ///
    /// Later storyboard-mode prompt requests pass it along as context.
    pub async fn analyze_script(&self, script: &str) -> PipelineResult<Storyboard> {
        let script = non_empty(script)?;
        let logger = ShotLogger::for_run("analyze_script");
        logger.started(&format!("{} chars", script.len()));

        let analysis = self
            .retry()
            .execute("analyze_script", || {
                self.collaborators().analyzer.analyze_script(script)
            })
            .instrument(logger.span())
            .await
            .inspect_err(|e| logger.failed(&e.to_string()))?;

        logger.finished(&format!("{} characters found", analysis.characters.len()));
        self.apply(|board| {
            board.analysis = Some(analysis);
            Ok(())
        })
    }

    /// Storyboard mode: send the whole script in one request and replace the
    /// shot sequence with one idle shot per returned triple.
    pub async fn build_storyboard(&self, script: &str) -> PipelineResult<Storyboard> {
        let script = non_empty(script)?;
        let logger = ShotLogger::for_run("build_storyboard");
        logger.started(&format!("{} chars", script.len()));

        let (context, analysis) = {
            let board = self.lock();
            (board.context.clone(), board.analysis.clone())
        };
        let context = self.outbound_context(context).await;
        let request = StoryboardRequest {
            script,
            context: &context,
            analysis: analysis.as_ref(),
        };

        let triples = self
            .retry()
            .execute("storyboard_prompts", || {
                self.collaborators().prompts.storyboard_prompts(request)
            })
            .instrument(logger.span())
            .await
            .inspect_err(|e| logger.failed(&e.to_string()))?;

        logger.finished(&format!("{} shots", triples.len()));
        self.replace_with(triples)
    }

    /// Continuous mode, first step: split `script` into reviewable segments.
    ///
    /// The result never exceeds the run's segment bound. Nothing is written
    /// to the storyboard until [`confirm_segments`](Self::confirm_segments).
    pub async fn split_script(&self, script: &str) -> PipelineResult<Vec<String>> {
        let script = non_empty(script)?;
        let logger = ShotLogger::for_run("split_script");

        let (duration, max_segments) = {
            let board = self.lock();
            (board.context.shot_duration_secs, board.context.max_segments())
        };
        logger.started(&format!("{}s shots, at most {}", duration, max_segments));

        let segments = self
            .retry()
            .execute("split_script", || {
                self.collaborators()
                    .splitter
                    .split_script(script, duration, max_segments)
            })
            .instrument(logger.span())
            .await
            .inspect_err(|e| logger.failed(&e.to_string()))?;

        let segments = bound_segments(segments, max_segments, script);
        logger.finished(&format!("{} segments", segments.len()));
        Ok(segments)
    }

    /// Continuous mode, second step: turn reviewed segments into shots with
    /// one batch prompt request.
    ///
    /// Exactly one shot is created per non-blank segment, in order. Segments
    /// the generator did not answer get a failure placeholder prompt.
    pub async fn confirm_segments(&self, segments: Vec<String>) -> PipelineResult<Storyboard> {
        let logger = ShotLogger::for_run("confirm_segments");
        let context = self.lock().context.clone();
        let segments = bound_segments(segments, context.max_segments(), "");
        if segments.is_empty() {
            return Err(PipelineError::EmptyScript);
        }
        logger.started(&format!("{} segments", segments.len()));

        let context = self.outbound_context(context).await;
        let returned = self
            .retry()
            .execute("batch_prompts", || {
                self.collaborators().prompts.batch_prompts(&segments, &context)
            })
            .instrument(logger.span())
            .await;

        let triples = match returned {
            Ok(triples) => PromptTriple::align_to_segments(&segments, triples),
            Err(e) if e.is_malformed() => {
                logger.warn(&format!("unusable batch reply, using placeholders: {}", e));
                PromptTriple::align_to_segments(&segments, Vec::new())
            }
            Err(e) => {
                logger.failed(&e.to_string());
                return Err(e.into());
            }
        };

        let placeholders = triples.iter().filter(|t| t.is_placeholder()).count();
        if placeholders > 0 {
            logger.warn(&format!("{} segments without prompts", placeholders));
        }
        logger.finished(&format!("{} shots", triples.len()));
        self.replace_with(triples)
    }

    /// Build shots from `script` the way the current mode does: one request
    /// in storyboard mode, split then batch in continuous mode.
    pub async fn script_to_shots(&self, script: &str) -> PipelineResult<Storyboard> {
        let mode = self.lock().mode;
        match mode {
            StoryboardMode::Storyboard => self.build_storyboard(script).await,
            StoryboardMode::Continuous => {
                let segments = self.split_script(script).await?;
                self.confirm_segments(segments).await
            }
        }
    }

    fn replace_with(&self, triples: Vec<PromptTriple>) -> PipelineResult<Storyboard> {
        let shots = triples.into_iter().map(Shot::from_prompts).collect();
        self.apply(|board| {
            board.replace_shots(shots);
            Ok(())
        })
    }
}

fn non_empty(script: &str) -> PipelineResult<&str> {
    let script = script.trim();
    if script.is_empty() {
        return Err(PipelineError::EmptyScript);
    }
    Ok(script)
}

