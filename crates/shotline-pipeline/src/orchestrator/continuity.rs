//! Continuity propagation between consecutive shots.
//!
//! After a clip finishes in continuous mode, its last frame becomes the start
//! frame of the next shot unless that shot already has one. The check runs
//! twice: before extraction, and again when writing, since a user upload or a
//! first-frame generation may land while the frame is being decoded. The
//! step is best effort and never fails the video request that triggered it.

use tracing::Instrument;

use shotline_models::{ShotId, VideoAsset};

use super::ShotOrchestrator;
use crate::logging::ShotLogger;
use crate::metrics::{continuity, record_continuity};

impl ShotOrchestrator {
    pub(crate) async fn propagate_continuity(&self, source: &ShotId, video: &VideoAsset) {
        let logger = ShotLogger::new(source, "continuity");

        let next = {
            let board = self.lock();
            if !board.mode.propagates_continuity() {
                return;
            }
            let Some(next) = board.successor(source) else {
                return;
            };
            if board.shot(&next).map_or(true, |s| s.has_start_frame()) {
                logger.handoff(&next, continuity::SKIPPED);
                record_continuity(continuity::SKIPPED);
                return;
            }
            next
        };

        tokio::time::sleep(self.inner.settle_delay).await;

        let extracted = self
            .collaborators()
            .frames
            .extract_last_frame(video)
            .instrument(logger.span())
            .await;

        let frame = match extracted {
            Ok(frame) => frame,
            Err(e) if e.is_extraction_timeout() => {
                logger.warn(&format!("last-frame extraction timed out: {}", e));
                record_continuity(continuity::TIMEOUT);
                return;
            }
            Err(e) => {
                logger.warn(&format!("last-frame extraction failed: {}", e));
                record_continuity(continuity::FAILED);
                return;
            }
        };

        let written = {
            let mut board = self.lock();
            let written = board
                .shot_mut(&next)
                .is_some_and(|shot| shot.inherit_start_frame(frame));
            if written {
                board.bump_version();
            }
            written
        };

        if written {
            logger.handoff(&next, continuity::PROPAGATED);
            record_continuity(continuity::PROPAGATED);
        } else {
            logger.handoff(&next, continuity::PREEMPTED);
            record_continuity(continuity::PREEMPTED);
        }
    }
}
