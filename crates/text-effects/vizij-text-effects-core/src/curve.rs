//! Keyframed scalar curves used for easing and layout offsets.
//!
//! Model:
//! - A curve is an ordered list of keyframes with strictly increasing times.
//! - Between two keys the value follows a cubic Hermite spline built from the
//!   left key's `out_tangent` and the right key's `in_tangent` (slopes in
//!   value-per-time units). A non-finite tangent holds the left value.
//! - Outside `[first.time, last.time]` the time is first folded back into
//!   range according to the pre/post [`WrapMode`].
//!
//! Callers must not assume the output is bounded or monotonic.

use serde::{Deserialize, Serialize};

use crate::error::TextEffectError;

/// Policy for resolving times outside the keyed range.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Clamp,
    Loop,
    PingPong,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// Keyframe with flat tangents on both sides.
    pub fn flat(time: f32, value: f32) -> Self {
        Self::new(time, value, 0.0, 0.0)
    }
}

/// Serialized form; converted through [`Curve::new`] so ordering is always checked.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CurveData {
    keys: Vec<Keyframe>,
    #[serde(default)]
    pre_wrap: WrapMode,
    #[serde(default)]
    post_wrap: WrapMode,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "CurveData", into = "CurveData")]
pub struct Curve {
    keys: Vec<Keyframe>,
    pre_wrap: WrapMode,
    post_wrap: WrapMode,
}

impl TryFrom<CurveData> for Curve {
    type Error = TextEffectError;

    fn try_from(data: CurveData) -> Result<Self, Self::Error> {
        Ok(Curve::new(data.keys)?.with_wrap(data.pre_wrap, data.post_wrap))
    }
}

impl From<Curve> for CurveData {
    fn from(curve: Curve) -> Self {
        CurveData {
            keys: curve.keys,
            pre_wrap: curve.pre_wrap,
            post_wrap: curve.post_wrap,
        }
    }
}

impl Default for Curve {
    /// Linear ramp from (0,0) to (1,1), the default easing.
    fn default() -> Self {
        Curve::linear(0.0, 0.0, 1.0, 1.0)
    }
}

impl Curve {
    /// Build a curve, validating that key times are finite and strictly increasing.
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, TextEffectError> {
        let mut last = f32::NEG_INFINITY;
        for (idx, key) in keys.iter().enumerate() {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(TextEffectError::InvalidCurve {
                    reason: format!("keyframe {idx} has a non-finite time or value"),
                });
            }
            if key.time <= last {
                return Err(TextEffectError::InvalidCurve {
                    reason: format!(
                        "keyframe times must be strictly increasing (key {idx} at {} after {last})",
                        key.time
                    ),
                });
            }
            last = key.time;
        }
        Ok(Self {
            keys,
            pre_wrap: WrapMode::Clamp,
            post_wrap: WrapMode::Clamp,
        })
    }

    /// Straight line between two keys; tangents equal the segment slope.
    ///
    /// Degenerate spans (`t1 <= t0`) collapse to a constant at `v1`.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        if t1 <= t0 {
            return Curve::constant(v1);
        }
        let slope = (v1 - v0) / (t1 - t0);
        Self {
            keys: vec![
                Keyframe::new(t0, v0, 0.0, slope),
                Keyframe::new(t1, v1, slope, 0.0),
            ],
            pre_wrap: WrapMode::Clamp,
            post_wrap: WrapMode::Clamp,
        }
    }

    /// Smooth step between two keys (flat tangents at both ends).
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        if t1 <= t0 {
            return Curve::constant(v1);
        }
        Self {
            keys: vec![Keyframe::flat(t0, v0), Keyframe::flat(t1, v1)],
            pre_wrap: WrapMode::Clamp,
            post_wrap: WrapMode::Clamp,
        }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![Keyframe::flat(0.0, value)],
            pre_wrap: WrapMode::Clamp,
            post_wrap: WrapMode::Clamp,
        }
    }

    pub fn with_wrap(mut self, pre_wrap: WrapMode, post_wrap: WrapMode) -> Self {
        self.pre_wrap = pre_wrap;
        self.post_wrap = post_wrap;
        self
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline]
    pub fn pre_wrap(&self) -> WrapMode {
        self.pre_wrap
    }

    #[inline]
    pub fn post_wrap(&self) -> WrapMode {
        self.post_wrap
    }

    /// Evaluate using the curve's own wrap modes.
    pub fn evaluate(&self, t: f32) -> f32 {
        self.evaluate_with(t, self.pre_wrap, self.post_wrap)
    }

    /// Evaluate with wrap modes supplied by the caller; the curve is left untouched.
    pub fn evaluate_with(&self, t: f32, pre_wrap: WrapMode, post_wrap: WrapMode) -> f32 {
        let n = self.keys.len();
        match n {
            0 => 0.0,
            1 => self.keys[0].value,
            _ => {
                let first = self.keys[0].time;
                let last = self.keys[n - 1].time;
                let t = if t.is_nan() { first } else { t };
                let local = if t < first {
                    wrap_time(t, first, last, pre_wrap)
                } else if t > last {
                    wrap_time(t, first, last, post_wrap)
                } else {
                    t
                };
                self.interpolate(local)
            }
        }
    }

    /// Hermite interpolation for `t` already inside the keyed range.
    fn interpolate(&self, t: f32) -> f32 {
        let keys = &self.keys;
        let n = keys.len();
        if t <= keys[0].time {
            return keys[0].value;
        }
        if t >= keys[n - 1].time {
            return keys[n - 1].value;
        }
        // First key strictly after t; keys are sorted so partition_point is valid.
        let hi = keys.partition_point(|k| k.time <= t).clamp(1, n - 1);
        let left = &keys[hi - 1];
        let right = &keys[hi];
        hermite(left, right, t)
    }
}

fn hermite(left: &Keyframe, right: &Keyframe, t: f32) -> f32 {
    let dt = right.time - left.time;
    if dt <= 0.0 {
        return right.value;
    }
    let m0 = left.out_tangent;
    let m1 = right.in_tangent;
    if !m0.is_finite() || !m1.is_finite() {
        return left.value;
    }
    let s = (t - left.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * left.value + h10 * dt * m0 + h01 * right.value + h11 * dt * m1
}

/// Fold `t` back into `[first, last]` according to `mode`.
fn wrap_time(t: f32, first: f32, last: f32, mode: WrapMode) -> f32 {
    let span = last - first;
    if span <= 0.0 {
        return first;
    }
    match mode {
        WrapMode::Clamp => t.clamp(first, last),
        WrapMode::Loop => first + (t - first).rem_euclid(span),
        WrapMode::PingPong => first + ping_pong(t - first, span),
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
pub(crate) fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = t.rem_euclid(2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

/// Pick the per-axis override when present, otherwise the shared fallback.
#[inline]
pub fn resolve_axis_curve<'a>(axis: Option<&'a Curve>, fallback: &'a Curve) -> &'a Curve {
    axis.unwrap_or(fallback)
}
