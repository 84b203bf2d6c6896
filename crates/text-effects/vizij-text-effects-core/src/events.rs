//! Output contracts from the scheduler.
//!
//! Rebuilds and ticks return reports carrying semantic events. Configuration
//! problems are surfaced here (and logged) instead of failing the rebuild.

use serde::{Deserialize, Serialize};

use crate::entry::{EffectScope, TriggerWhen};
use crate::ids::EntryId;

/// Discrete signals emitted while rebuilding or ticking.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum TextEffectEvent {
    /// A OneTime entry finished on every character of its range.
    EffectCompleted {
        entry: EntryId,
        tag: String,
        scope: EffectScope,
        trigger: TriggerWhen,
    },
    /// An annotation named an effect no template carries.
    EffectNotFound { name: String },
    /// Several templates share a tag; the first registered one was used.
    AmbiguousEffect { name: String, matches: usize },
    /// A manual start request named an unknown manual effect.
    ManualEffectNotFound {
        name: String,
        scope: EffectScope,
        available: Vec<String>,
    },
}

/// Result of a structural rebuild.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RebuildReport {
    /// Layout effects mutated geometry; the host should flush it.
    pub awake_applied: bool,
    #[serde(default)]
    pub events: Vec<TextEffectEvent>,
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FrameStatus {
    /// Rate limited; nothing was touched.
    #[default]
    Skipped,
    /// The character sweep ran and geometry needs flushing.
    Applied,
}

/// Outputs returned by `TextEffectScheduler::tick`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameOutputs {
    pub status: FrameStatus,
    #[serde(default)]
    pub events: Vec<TextEffectEvent>,
}

impl FrameOutputs {
    #[inline]
    pub fn applied(&self) -> bool {
        self.status == FrameStatus::Applied
    }

    #[inline]
    pub fn push_event(&mut self, event: TextEffectEvent) {
        self.events.push(event);
    }
}

/// Snapshot of one scheduled entry for host queries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectStatus {
    pub tag: String,
    pub started: bool,
    pub is_complete: bool,
}
