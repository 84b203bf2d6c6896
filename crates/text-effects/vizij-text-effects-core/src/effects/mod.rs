//! Effect templates and their geometric variants.
//!
//! An [`Effect`] is a long-lived, shareable definition: a tag used for lookup,
//! timing parameters and one [`EffectKind`]. Playback never mutates it; the
//! scheduler clones it into an [`EffectInstance`] per use.

pub mod color;
pub mod curve_follow;
pub mod scale;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::instance::EffectInstance;
use crate::timing::EffectTiming;

pub use color::{ColorEffect, FadeEffect};
pub use curve_follow::{CurveFollowEffect, SourceCache};
pub use scale::ScaleEffect;
pub use transform::{MoveEffect, RotateEffect, RotatePivot};

/// Closed set of effect variants dispatched by [`EffectInstance::apply`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    CurveFollow(CurveFollowEffect),
    Scale(ScaleEffect),
    Move(MoveEffect),
    Rotate(RotateEffect),
    Fade(FadeEffect),
    Color(ColorEffect),
}

impl EffectKind {
    /// Effects that establish base geometry and must run before the first visible frame.
    #[inline]
    pub fn plays_during_layout(&self) -> bool {
        matches!(self, EffectKind::CurveFollow(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::CurveFollow(_) => "curve_follow",
            EffectKind::Scale(_) => "scale",
            EffectKind::Move(_) => "move",
            EffectKind::Rotate(_) => "rotate",
            EffectKind::Fade(_) => "fade",
            EffectKind::Color(_) => "color",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    /// Name matched against tag annotations and manual-start requests.
    pub tag: String,
    #[serde(default)]
    pub timing: EffectTiming,
    pub kind: EffectKind,
}

impl Effect {
    pub fn new(tag: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            tag: tag.into(),
            timing: EffectTiming::default(),
            kind,
        }
    }

    pub fn with_timing(mut self, timing: EffectTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Clone into an independent instance bound to `[start_char_index, start_char_index + char_length)`.
    pub fn instantiate(&self, start_char_index: usize, char_length: usize) -> EffectInstance {
        EffectInstance::new(self.clone(), start_char_index, char_length)
    }
}
