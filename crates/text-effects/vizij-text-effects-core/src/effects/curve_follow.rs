//! Curved baseline: glyphs ride a curve across the text width.
//!
//! The effect reads from a snapshot of the pre-effect geometry so that
//! re-applying it every frame lands on the same result. The snapshot is keyed
//! by `TextInfo::generation`; a new layout pass invalidates it.

use serde::{Deserialize, Serialize};

use crate::curve::{Curve, Keyframe};
use crate::text::{baseline_pivot, rotate_xy, TextInfo, Vec3, QUAD_VERTS};

/// Minimum spread between cached min/max X.
const MIN_TEXT_WIDTH: f32 = 1e-4;
/// Floor for the tangent's horizontal delta.
const MIN_TANGENT_DX: f32 = 1e-5;
/// Widths below this still sample the tangent 1/1024 apart.
const TANGENT_SAMPLES: f32 = 1024.0;

fn default_bell() -> Curve {
    Curve::new(vec![
        Keyframe::flat(0.0, 0.0),
        Keyframe::flat(0.5, 1.0),
        Keyframe::flat(1.0, 0.0),
    ])
    .unwrap_or_default()
}

fn default_amplitude() -> f32 {
    32.0
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveFollowEffect {
    /// Normalized X in [0,1] -> vertical offset (scaled by `amplitude`).
    #[serde(default = "default_bell")]
    pub curve: Curve,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    /// Rotate quads to follow the curve tangent.
    #[serde(default = "default_true")]
    pub apply_rotation: bool,
}

impl Default for CurveFollowEffect {
    fn default() -> Self {
        Self {
            curve: default_bell(),
            amplitude: default_amplitude(),
            apply_rotation: true,
        }
    }
}

/// Snapshot of original vertex positions plus the text's horizontal extent.
#[derive(Clone, Debug, Default)]
pub struct SourceCache {
    generation: Option<u64>,
    meshes: Vec<Vec<Vec3>>,
    min_x: f32,
    max_x: f32,
}

impl SourceCache {
    #[inline]
    pub fn invalidate(&mut self) {
        self.generation = None;
    }

    #[inline]
    pub fn is_valid_for(&self, generation: u64) -> bool {
        self.generation == Some(generation)
    }

    /// Horizontal extent of the cached text, if captured.
    pub fn extent(&self) -> Option<(f32, f32)> {
        self.generation.map(|_| (self.min_x, self.max_x))
    }

    pub(crate) fn capture(&mut self, text: &TextInfo) {
        self.meshes.resize_with(text.meshes.len(), Vec::new);
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        for (copy, mesh) in self.meshes.iter_mut().zip(text.meshes.iter()) {
            copy.clear();
            copy.extend_from_slice(&mesh.vertices);
            for v in &mesh.vertices {
                min_x = min_x.min(v[0]);
                max_x = max_x.max(v[0]);
            }
        }
        if !min_x.is_finite() || !max_x.is_finite() {
            min_x = 0.0;
            max_x = 0.0;
        }
        if max_x <= min_x {
            max_x = min_x + MIN_TEXT_WIDTH;
        }
        self.min_x = min_x;
        self.max_x = max_x;
        self.generation = Some(text.generation);
    }

    fn quad(&self, material_index: usize, vertex_index: usize) -> Option<[Vec3; QUAD_VERTS]> {
        let v = self
            .meshes
            .get(material_index)?
            .get(vertex_index..vertex_index + QUAD_VERTS)?;
        Some([v[0], v[1], v[2], v[3]])
    }
}

#[inline]
fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

impl CurveFollowEffect {
    /// Vertical offset and tangent angle (radians) at normalized position `t`.
    pub fn sample(&self, t: f32, width: f32) -> (f32, f32) {
        let y_offset = self.curve.evaluate(t) * self.amplitude;
        if !self.apply_rotation {
            return (y_offset, 0.0);
        }
        let eps_t = 1.0 / TANGENT_SAMPLES.max(width);
        let t2 = (t + eps_t).clamp(0.0, 1.0);
        let dy = (self.curve.evaluate(t2) - self.curve.evaluate(t)) * self.amplitude;
        let dx = (t2 - t) * width;
        (y_offset, dy.atan2(dx.max(MIN_TANGENT_DX)))
    }

    /// Write the warped quad of `char_index` from cached originals.
    pub(crate) fn apply(&self, cache: &mut SourceCache, text: &mut TextInfo, char_index: usize) {
        if !cache.is_valid_for(text.generation) {
            cache.capture(text);
        }
        let Some(info) = text.characters.get(char_index) else {
            return;
        };
        let Some(source) = cache.quad(info.material_index, info.vertex_index) else {
            return;
        };

        let pivot = baseline_pivot(&source);
        let mut char_min_x = f32::INFINITY;
        let mut char_max_x = f32::NEG_INFINITY;
        for v in &source {
            char_min_x = char_min_x.min(v[0]);
            char_max_x = char_max_x.max(v[0]);
        }
        let center_x = (char_min_x + char_max_x) * 0.5;
        let width = cache.max_x - cache.min_x;
        let t = inverse_lerp(cache.min_x, cache.max_x, center_x);
        let (y_offset, angle) = self.sample(t, width);
        let (sin, cos) = angle.sin_cos();

        let Some(dest) = text.quad_mut(char_index) else {
            return;
        };
        for (out, original) in dest.iter_mut().zip(source.iter()) {
            let mut p = rotate_xy(*original, pivot, sin, cos);
            p[1] += y_offset;
            *out = p;
        }
    }
}
