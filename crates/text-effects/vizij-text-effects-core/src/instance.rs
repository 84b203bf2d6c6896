//! EffectInstance: a cloned [`Effect`] plus its playback state.
//!
//! Instances are created by the scheduler on every rebuild and discarded on the
//! next one; they are never pooled or reused across text changes.

use std::ops::RangeInclusive;

use crate::effects::{Effect, EffectKind, SourceCache};
use crate::interp::lerp_f32;
use crate::text::TextInfo;
use crate::timing::{EffectTiming, Playback};

/// All four quad corners.
pub const ALL_VERTICES: RangeInclusive<usize> = 0..=3;

/// Read-only timing view handed to effect variants for one `now`.
#[derive(Clone, Copy, Debug)]
pub struct ProgressView<'a> {
    pub playback: &'a Playback,
    pub timing: &'a EffectTiming,
    pub now: f64,
}

impl<'a> ProgressView<'a> {
    #[inline]
    pub fn progress(&self, char_index: usize) -> f32 {
        self.playback.progress(char_index, self.now, self.timing)
    }

    /// Progress mapped through the easing curve (wrap rule and clamp flag applied).
    #[inline]
    pub fn eased_progress(&self, char_index: usize) -> f32 {
        self.timing
            .ease_with(&self.timing.easing_curve, self.progress(char_index))
    }

    /// Unclamped lerp between `start` and `end` by eased progress.
    #[inline]
    pub fn interpolate(&self, start: f32, end: f32, char_index: usize) -> f32 {
        lerp_f32(start, end, self.eased_progress(char_index))
    }
}

#[derive(Clone, Debug)]
pub struct EffectInstance {
    effect: Effect,
    playback: Playback,
    source_cache: SourceCache,
}

impl EffectInstance {
    pub fn new(effect: Effect, start_char_index: usize, char_length: usize) -> Self {
        Self {
            effect,
            playback: Playback::new(start_char_index, char_length),
            source_cache: SourceCache::default(),
        }
    }

    #[inline]
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.effect.tag
    }

    #[inline]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.playback.started
    }

    pub fn start(&mut self, now: f64) {
        self.playback.start(now);
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn is_complete(&self, now: f64) -> bool {
        self.playback.is_complete(now, &self.effect.timing)
    }

    pub fn view(&self, now: f64) -> ProgressView<'_> {
        ProgressView {
            playback: &self.playback,
            timing: &self.effect.timing,
            now,
        }
    }

    pub fn time_for_char(&self, char_index: usize, now: f64) -> f32 {
        self.playback
            .time_for_char(char_index, now, &self.effect.timing)
    }

    pub fn progress(&self, char_index: usize, now: f64) -> f32 {
        self.view(now).progress(char_index)
    }

    pub fn eased_progress(&self, char_index: usize, now: f64) -> f32 {
        self.view(now).eased_progress(char_index)
    }

    /// Re-arm a `LoopFixedDuration` instance whose cycle has elapsed.
    pub fn rewind_fixed_cycle(&mut self, now: f64) -> bool {
        self.playback.rewind_fixed_cycle(now, &self.effect.timing)
    }

    /// Snapshot layout geometry for curve follow before anything writes to `text`.
    ///
    /// Stacked layout effects must all read the same untouched vertices; a
    /// lazy capture inside the character loop would see earlier warps.
    pub fn prepare(&mut self, text: &TextInfo) {
        if matches!(self.effect.kind, EffectKind::CurveFollow(_))
            && !self.source_cache.is_valid_for(text.generation)
        {
            self.source_cache.capture(text);
        }
    }

    /// Drop the curve-follow geometry snapshot; it is recaptured on next apply.
    pub fn invalidate_source_cache(&mut self) {
        self.source_cache.invalidate();
    }

    /// Mutate the quad of `char_index` in place.
    ///
    /// Characters outside the instance range or invisible are skipped silently.
    /// Time-driven variants also skip while the instance is stopped; the
    /// layout warp is static and always applies.
    pub fn apply(
        &mut self,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
        now: f64,
    ) {
        if !self.playback.contains(char_index) || !text.is_visible(char_index) {
            return;
        }
        if let EffectKind::CurveFollow(curve) = &self.effect.kind {
            curve.apply(&mut self.source_cache, text, char_index);
            return;
        }
        if !self.playback.started {
            return;
        }
        let view = ProgressView {
            playback: &self.playback,
            timing: &self.effect.timing,
            now,
        };
        match &self.effect.kind {
            EffectKind::CurveFollow(_) => {}
            EffectKind::Scale(scale) => scale.apply(&view, text, char_index, vertices),
            EffectKind::Move(mv) => mv.apply(&view, text, char_index, vertices),
            EffectKind::Rotate(rot) => rot.apply(&view, text, char_index, vertices),
            EffectKind::Fade(fade) => fade.apply(&view, text, char_index, vertices),
            EffectKind::Color(color) => color.apply(&view, text, char_index, vertices),
        }
    }
}
