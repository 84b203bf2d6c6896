//! Interpolation helpers:
//! - lerp_f32 (unclamped scalar)
//! - lerp_vec3 (component-wise)
//! - lerp_rgba8 (component-wise, clamped and rounded to bytes)

use crate::text::{Rgba8, Vec3};

/// Linear interpolation of scalars. `t` is not clamped.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn lerp_rgba8(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    let ch = |i: usize| {
        lerp_f32(f32::from(a[i]), f32::from(b[i]), t)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [ch(0), ch(1), ch(2), ch(3)]
}
