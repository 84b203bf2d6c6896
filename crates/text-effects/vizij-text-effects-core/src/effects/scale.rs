//! Uniform or per-axis scaling about each quad's centroid.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::curve::{resolve_axis_curve, Curve};
use crate::instance::ProgressView;
use crate::interp::lerp_f32;
use crate::text::{centroid, TextInfo, Vec3};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleEffect {
    pub start_scale: f32,
    pub end_scale: f32,
    /// Evaluate each axis against its own curve (squash and stretch).
    pub use_axis_easing: bool,
    /// Axis overrides; `None` falls back to the timing's easing curve.
    pub x_curve: Option<Curve>,
    pub y_curve: Option<Curve>,
    pub z_curve: Option<Curve>,
}

impl Default for ScaleEffect {
    fn default() -> Self {
        Self {
            start_scale: 0.0,
            end_scale: 1.0,
            use_axis_easing: false,
            x_curve: None,
            y_curve: None,
            z_curve: None,
        }
    }
}

impl ScaleEffect {
    /// Per-axis scale for `char_index` at the view's time.
    pub fn scale_for(&self, view: &ProgressView<'_>, char_index: usize) -> Vec3 {
        if !self.use_axis_easing {
            let s = view.interpolate(self.start_scale, self.end_scale, char_index);
            return [s, s, s];
        }
        let progress = view.progress(char_index);
        let shared = &view.timing.easing_curve;
        let axis = |over: Option<&Curve>| {
            let eased = view
                .timing
                .ease_with(resolve_axis_curve(over, shared), progress);
            lerp_f32(self.start_scale, self.end_scale, eased)
        };
        [
            axis(self.x_curve.as_ref()),
            axis(self.y_curve.as_ref()),
            axis(self.z_curve.as_ref()),
        ]
    }

    pub(crate) fn apply(
        &self,
        view: &ProgressView<'_>,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
    ) {
        let scale = self.scale_for(view, char_index);
        let Some(quad) = text.quad_mut(char_index) else {
            return;
        };
        let center = centroid(quad);
        for v in vertices {
            if let Some(p) = quad.get_mut(v) {
                for axis in 0..3 {
                    p[axis] = center[axis] + (p[axis] - center[axis]) * scale[axis];
                }
            }
        }
    }
}
