//! Per-character time math for effect instances.
//!
//! Progress is always derived from `(now, start_time)`; nothing here caches a
//! per-character value, so evaluating twice at the same `now` is idempotent.
//!
//! elapsed(i)  = (now - start_time) - delay * index_in_range(i)
//! raw(i)      = elapsed(i) / max(EPSILON, duration_per_char)
//! progress(i) = clamp01(raw) for OneTime/LoopFixedDuration, raw otherwise

use serde::{Deserialize, Serialize};

use crate::curve::{Curve, WrapMode};

/// Smallest duration used as a divisor.
pub const DURATION_EPSILON: f32 = 1e-5;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    #[default]
    OneTime,
    /// Plays once per character, re-armed every `fixed_duration` seconds by the scheduler.
    LoopFixedDuration,
    /// Unclamped progress wrapped by the easing curve (Loop).
    Loop,
    /// Unclamped progress wrapped by the easing curve (PingPong).
    PingPong,
}

impl AnimationType {
    #[inline]
    pub fn is_looping(self) -> bool {
        !matches!(self, AnimationType::OneTime)
    }
}

/// Authoring-time timing parameters shared by every effect variant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EffectTiming {
    pub animation_type: AnimationType,
    pub duration_per_char: f32,
    pub delay_per_char: f32,
    /// Cycle length for `LoopFixedDuration`.
    pub fixed_duration: f32,
    /// All characters start together; also lets looping curves wrap before t = 0.
    pub no_delay_for_chars: bool,
    pub reverse_char_order: bool,
    pub easing_curve: Curve,
    pub clamp_between_0_and_1: bool,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            animation_type: AnimationType::OneTime,
            duration_per_char: 0.5,
            delay_per_char: 0.1,
            fixed_duration: 1.0,
            no_delay_for_chars: false,
            reverse_char_order: false,
            easing_curve: Curve::default(),
            clamp_between_0_and_1: false,
        }
    }
}

impl EffectTiming {
    /// Per-character delay in effect; negative delays count as none.
    #[inline]
    fn effective_delay(&self) -> f32 {
        if self.no_delay_for_chars {
            0.0
        } else {
            self.delay_per_char.max(0.0)
        }
    }

    /// Duration divisor shared by progress and completion.
    #[inline]
    fn effective_duration(&self) -> f32 {
        self.duration_per_char.max(DURATION_EPSILON)
    }

    /// Wrap modes imposed on the easing curve for this animation type.
    ///
    /// Looping types only wrap before t = 0 when every character starts together;
    /// otherwise staggered characters would play before their delay elapses.
    pub fn easing_wrap(&self) -> (WrapMode, WrapMode) {
        let looped = match self.animation_type {
            AnimationType::Loop => WrapMode::Loop,
            AnimationType::PingPong => WrapMode::PingPong,
            AnimationType::OneTime | AnimationType::LoopFixedDuration => {
                return (self.easing_curve.pre_wrap(), self.easing_curve.post_wrap());
            }
        };
        let pre = if self.no_delay_for_chars {
            looped
        } else {
            WrapMode::Clamp
        };
        (pre, looped)
    }

    /// Evaluate `curve` at `progress` with this timing's wrap policy and clamp flag.
    pub fn ease_with(&self, curve: &Curve, progress: f32) -> f32 {
        let (pre, post) = match self.animation_type {
            AnimationType::OneTime | AnimationType::LoopFixedDuration => {
                (curve.pre_wrap(), curve.post_wrap())
            }
            _ => self.easing_wrap(),
        };
        let eased = curve.evaluate_with(progress, pre, post);
        if self.clamp_between_0_and_1 {
            eased.clamp(0.0, 1.0)
        } else {
            eased
        }
    }
}

/// Mutable playback state of one effect instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Playback {
    pub started: bool,
    pub start_time: f64,
    pub start_char_index: usize,
    pub char_length: usize,
}

impl Playback {
    pub fn new(start_char_index: usize, char_length: usize) -> Self {
        Self {
            started: false,
            start_time: 0.0,
            start_char_index,
            char_length,
        }
    }

    /// Arm the instance; restarting resets the clock.
    pub fn start(&mut self, now: f64) {
        self.start_time = now;
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    #[inline]
    pub fn contains(&self, char_index: usize) -> bool {
        char_index >= self.start_char_index
            && char_index < self.start_char_index.saturating_add(self.char_length)
    }

    /// Position of `char_index` in play order (last character first when reversed).
    pub fn index_in_range(&self, char_index: usize, timing: &EffectTiming) -> usize {
        let offset = char_index.saturating_sub(self.start_char_index);
        if timing.reverse_char_order {
            self.char_length.saturating_sub(1).saturating_sub(offset)
        } else {
            offset
        }
    }

    /// Seconds since this character's own start; negative while its delay is pending.
    pub fn time_for_char(&self, char_index: usize, now: f64, timing: &EffectTiming) -> f32 {
        let elapsed = (now - self.start_time) as f32;
        let order = self.index_in_range(char_index, timing) as f32;
        elapsed - timing.effective_delay() * order
    }

    pub fn raw_progress(&self, char_index: usize, now: f64, timing: &EffectTiming) -> f32 {
        self.time_for_char(char_index, now, timing) / timing.effective_duration()
    }

    /// Normalized progress fed into curves; 0 while stopped.
    pub fn progress(&self, char_index: usize, now: f64, timing: &EffectTiming) -> f32 {
        if !self.started {
            return 0.0;
        }
        let raw = self.raw_progress(char_index, now, timing);
        match timing.animation_type {
            AnimationType::OneTime | AnimationType::LoopFixedDuration => raw.clamp(0.0, 1.0),
            AnimationType::Loop | AnimationType::PingPong => raw,
        }
    }

    /// Seconds until the last character in play order reaches raw progress 1.
    pub fn total_duration(&self, timing: &EffectTiming) -> f32 {
        let last = self.char_length.saturating_sub(1) as f32;
        timing.effective_delay() * last + timing.effective_duration()
    }

    /// True only for a started OneTime instance whose every character finished.
    pub fn is_complete(&self, now: f64, timing: &EffectTiming) -> bool {
        if !self.started || timing.animation_type != AnimationType::OneTime {
            return false;
        }
        (now - self.start_time) as f32 >= self.total_duration(timing)
    }

    /// Advance `start_time` by whole `fixed_duration` cycles that have fully elapsed.
    ///
    /// Returns true when the instance was re-armed.
    pub fn rewind_fixed_cycle(&mut self, now: f64, timing: &EffectTiming) -> bool {
        if !self.started || timing.animation_type != AnimationType::LoopFixedDuration {
            return false;
        }
        let cycle = f64::from(timing.fixed_duration.max(DURATION_EPSILON));
        let elapsed = now - self.start_time;
        if elapsed < cycle {
            return false;
        }
        let cycles = (elapsed / cycle).floor();
        self.start_time += cycles * cycle;
        true
    }
}
