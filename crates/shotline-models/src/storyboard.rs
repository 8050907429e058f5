//! The storyboard run: an ordered, versioned sequence of shots plus the shared
//! generation context.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{GenerationContext, ScriptAnalysis, Shot, ShotId, StoryboardMode};

/// Ordered shot sequence with its shared generation context.
///
/// `version` increases by one for every applied mutation, so two snapshots of
/// the same run can be ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Storyboard {
    version: u64,

    /// Script-to-shots mode; continuous mode enables continuity propagation
    pub mode: StoryboardMode,

    /// Settings shared by all generation requests
    pub context: GenerationContext,

    /// Deep analysis of the source script, if one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ScriptAnalysis>,

    shots: Vec<Shot>,
}

impl Storyboard {
    /// Create an empty run.
    pub fn new(mode: StoryboardMode, context: GenerationContext) -> Self {
        Self {
            version: 0,
            mode,
            context,
            analysis: None,
            shots: Vec::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mark one mutation as applied.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn shot(&self, id: &ShotId) -> Option<&Shot> {
        self.shots.iter().find(|s| &s.id == id)
    }

    pub fn shot_mut(&mut self, id: &ShotId) -> Option<&mut Shot> {
        self.shots.iter_mut().find(|s| &s.id == id)
    }

    pub fn position(&self, id: &ShotId) -> Option<usize> {
        self.shots.iter().position(|s| &s.id == id)
    }

    /// ID of the shot immediately after `id`, if any.
    pub fn successor(&self, id: &ShotId) -> Option<ShotId> {
        let index = self.position(id)?;
        self.shots.get(index + 1).map(|s| s.id.clone())
    }

    /// Append a shot at the end of the sequence.
    pub fn push(&mut self, shot: Shot) {
        self.shots.push(shot);
    }

    /// Replace the whole sequence (a new script was turned into shots).
    pub fn replace_shots(&mut self, shots: Vec<Shot>) {
        self.shots = shots;
    }
}
