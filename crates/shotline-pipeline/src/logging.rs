//! Shot-scoped logging.
//!
//! Lines carry the shot, the operation and, for generation requests, the slot
//! being driven, so a shot's image and video pipelines can be followed
//! separately. Script construction logs without a shot.

use tracing::{error, info, warn, Span};

use shotline_models::{GenerationState, Shot, ShotId, Slot};

#[derive(Debug, Clone)]
pub struct ShotLogger {
    shot_id: Option<ShotId>,
    operation: &'static str,
    slot: Option<Slot>,
}

impl ShotLogger {
    pub fn new(shot_id: &ShotId, operation: &'static str) -> Self {
        Self {
            shot_id: Some(shot_id.clone()),
            operation,
            slot: None,
        }
    }

    /// Logger for a generation request driving one slot of a shot.
    pub fn for_slot(shot_id: &ShotId, slot: Slot) -> Self {
        let operation = match slot {
            Slot::Image => "first_frame",
            Slot::Video => "video",
        };
        Self {
            shot_id: Some(shot_id.clone()),
            operation,
            slot: Some(slot),
        }
    }

    /// Logger for operations over the whole storyboard.
    pub fn for_run(operation: &'static str) -> Self {
        Self {
            shot_id: None,
            operation,
            slot: None,
        }
    }

    pub fn shot_label(&self) -> &str {
        self.shot_id.as_ref().map_or("-", |id| id.as_str())
    }

    pub fn slot_label(&self) -> &'static str {
        match self.slot {
            Some(Slot::Image) => "image",
            Some(Slot::Video) => "video",
            None => "-",
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn started(&self, detail: &str) {
        info!(
            shot_id = %self.shot_label(),
            operation = self.operation,
            slot = self.slot_label(),
            "{} started ({})", self.operation, detail
        );
    }

    pub fn note(&self, detail: &str) {
        info!(
            shot_id = %self.shot_label(),
            operation = self.operation,
            slot = self.slot_label(),
            "{}", detail
        );
    }

    pub fn warn(&self, detail: &str) {
        warn!(
            shot_id = %self.shot_label(),
            operation = self.operation,
            slot = self.slot_label(),
            "{}", detail
        );
    }

    pub fn failed(&self, detail: &str) {
        error!(
            shot_id = %self.shot_label(),
            operation = self.operation,
            "{} failed: {}", self.operation, detail
        );
    }

    pub fn finished(&self, detail: &str) {
        info!(
            shot_id = %self.shot_label(),
            operation = self.operation,
            "{} finished ({})", self.operation, detail
        );
    }

    /// Report where this logger's slot ended up once a request settled.
    pub fn settled(&self, shot: &Shot) {
        let Some(slot) = self.slot else {
            return;
        };
        let state = shot.state(slot);
        let error = match slot {
            Slot::Image => shot.image_error(),
            Slot::Video => shot.video_error(),
        };
        if state == GenerationState::Error {
            error!(
                shot_id = %self.shot_label(),
                slot = self.slot_label(),
                state = state.as_str(),
                "{} slot failed: {}", slot, error.unwrap_or("unknown error")
            );
            return;
        }
        let asset = match slot {
            Slot::Image => shot
                .start_frame
                .as_ref()
                .map(|frame| format!("{} byte start frame", frame.len())),
            Slot::Video => shot.video.as_ref().map(|video| video.uri.clone()),
        };
        info!(
            shot_id = %self.shot_label(),
            slot = self.slot_label(),
            state = state.as_str(),
            "{} slot settled: {}", slot, asset.as_deref().unwrap_or("no asset")
        );
    }

    /// Report the outcome of handing this shot's last frame to `target`.
    pub fn handoff(&self, target: &ShotId, outcome: &'static str) {
        info!(
            shot_id = %self.shot_label(),
            target_shot_id = %target,
            outcome,
            "start frame handoff to {}: {}", target, outcome
        );
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "shot",
            shot_id = %self.shot_label(),
            operation = self.operation,
            slot = self.slot_label()
        )
    }
}
