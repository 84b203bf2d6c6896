//! Position and rotation variants.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::instance::ProgressView;
use crate::interp::{lerp_f32, lerp_vec3};
use crate::text::{baseline_pivot, centroid, rotate_xy, TextInfo, Vec3, QUAD_VERTS};

/// Offset glyphs from `start_offset` to `end_offset`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoveEffect {
    pub start_offset: Vec3,
    pub end_offset: Vec3,
}

impl MoveEffect {
    pub(crate) fn apply(
        &self,
        view: &ProgressView<'_>,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
    ) {
        let eased = view.eased_progress(char_index);
        let offset = lerp_vec3(self.start_offset, self.end_offset, eased);
        let Some(quad) = text.quad_mut(char_index) else {
            return;
        };
        for v in vertices {
            if let Some(p) = quad.get_mut(v) {
                p[0] += offset[0];
                p[1] += offset[1];
                p[2] += offset[2];
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotatePivot {
    #[default]
    Center,
    Baseline,
}

/// Spin glyphs in the XY plane; angles in degrees.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotateEffect {
    pub start_angle: f32,
    pub end_angle: f32,
    pub pivot: RotatePivot,
}

impl RotateEffect {
    pub(crate) fn apply(
        &self,
        view: &ProgressView<'_>,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
    ) {
        let degrees = lerp_f32(
            self.start_angle,
            self.end_angle,
            view.eased_progress(char_index),
        );
        let (sin, cos) = degrees.to_radians().sin_cos();
        let Some(quad) = text.quad_mut(char_index) else {
            return;
        };
        let pivot = match self.pivot {
            RotatePivot::Center => centroid(quad),
            RotatePivot::Baseline => {
                let corners: [Vec3; QUAD_VERTS] = [quad[0], quad[1], quad[2], quad[3]];
                baseline_pivot(&corners)
            }
        };
        for v in vertices {
            if let Some(p) = quad.get_mut(v) {
                *p = rotate_xy(*p, pivot, sin, cos);
            }
        }
    }
}
