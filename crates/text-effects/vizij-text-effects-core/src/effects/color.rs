//! Vertex colour variants. Both are no-ops on partitions without colours.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::instance::ProgressView;
use crate::interp::{lerp_f32, lerp_rgba8};
use crate::text::{Rgba8, TextInfo};

/// Multiplies the existing vertex alpha by an interpolated opacity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FadeEffect {
    pub start_alpha: f32,
    pub end_alpha: f32,
}

impl Default for FadeEffect {
    fn default() -> Self {
        Self {
            start_alpha: 0.0,
            end_alpha: 1.0,
        }
    }
}

impl FadeEffect {
    pub(crate) fn apply(
        &self,
        view: &ProgressView<'_>,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
    ) {
        let alpha = lerp_f32(
            self.start_alpha,
            self.end_alpha,
            view.eased_progress(char_index),
        )
        .clamp(0.0, 1.0);
        let Some(colors) = text.quad_colors_mut(char_index) else {
            return;
        };
        for v in vertices {
            if let Some(c) = colors.get_mut(v) {
                c[3] = (f32::from(c[3]) * alpha).round() as u8;
            }
        }
    }
}

/// Replaces vertex colours with an interpolated RGBA colour.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorEffect {
    pub start_color: Rgba8,
    pub end_color: Rgba8,
}

impl Default for ColorEffect {
    fn default() -> Self {
        Self {
            start_color: [255, 255, 255, 255],
            end_color: [255, 255, 255, 255],
        }
    }
}

impl ColorEffect {
    pub(crate) fn apply(
        &self,
        view: &ProgressView<'_>,
        text: &mut TextInfo,
        char_index: usize,
        vertices: RangeInclusive<usize>,
    ) {
        let color = lerp_rgba8(
            self.start_color,
            self.end_color,
            view.eased_progress(char_index),
        );
        let Some(colors) = text.quad_colors_mut(char_index) else {
            return;
        };
        for v in vertices {
            if let Some(c) = colors.get_mut(v) {
                *c = color;
            }
        }
    }
}
