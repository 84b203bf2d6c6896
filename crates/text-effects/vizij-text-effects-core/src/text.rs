//! Per-frame glyph geometry handed over by the layout collaborator.
//!
//! The layout engine owns shaping; this crate only reads character metadata
//! and rewrites quad vertex positions/colours in place. Each visible
//! character owns four consecutive vertices starting at `vertex_index` in the
//! mesh partition selected by `material_index`.

use serde::{Deserialize, Serialize};

/// Three-component position used for quad corners.
pub type Vec3 = [f32; 3];
/// 8-bit RGBA vertex colour.
pub type Rgba8 = [u8; 4];

/// Number of vertices per character quad.
pub const QUAD_VERTS: usize = 4;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterInfo {
    pub is_visible: bool,
    /// Offset of the first quad vertex in the partition's vertex array.
    pub vertex_index: usize,
    /// Mesh/material partition holding this character's quad.
    pub material_index: usize,
    pub bottom_left: Vec3,
    pub top_right: Vec3,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MeshPartition {
    pub vertices: Vec<Vec3>,
    #[serde(default)]
    pub colors: Vec<Rgba8>,
}

/// A tag annotation spanning `length` characters (e.g. `<link="Bounce+Fade">`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSpan {
    pub id: String,
    pub first_char_index: usize,
    pub length: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TextInfo {
    pub characters: Vec<CharacterInfo>,
    pub meshes: Vec<MeshPartition>,
    #[serde(default)]
    pub links: Vec<LinkSpan>,
    /// Bumped by the layout collaborator every time it re-lays out the text.
    #[serde(default)]
    pub generation: u64,
}

impl TextInfo {
    #[inline]
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    #[inline]
    pub fn is_visible(&self, char_index: usize) -> bool {
        self.characters
            .get(char_index)
            .is_some_and(|c| c.is_visible)
    }

    /// The four quad corners of a character, if its vertices exist.
    pub fn quad(&self, char_index: usize) -> Option<[Vec3; QUAD_VERTS]> {
        let info = self.characters.get(char_index)?;
        let verts = self.meshes.get(info.material_index)?.vertices.get(
            info.vertex_index..info.vertex_index + QUAD_VERTS,
        )?;
        Some([verts[0], verts[1], verts[2], verts[3]])
    }

    /// Mutable quad vertices of a character, if present.
    pub fn quad_mut(&mut self, char_index: usize) -> Option<&mut [Vec3]> {
        let info = self.characters.get(char_index)?;
        let (mat, start) = (info.material_index, info.vertex_index);
        self.meshes
            .get_mut(mat)?
            .vertices
            .get_mut(start..start + QUAD_VERTS)
    }

    /// Mutable quad colours of a character, if the partition carries colours.
    pub fn quad_colors_mut(&mut self, char_index: usize) -> Option<&mut [Rgba8]> {
        let info = self.characters.get(char_index)?;
        let (mat, start) = (info.material_index, info.vertex_index);
        self.meshes
            .get_mut(mat)?
            .colors
            .get_mut(start..start + QUAD_VERTS)
    }
}

#[inline]
pub(crate) fn centroid(quad: &[Vec3]) -> Vec3 {
    let mut c = [0.0f32; 3];
    if quad.is_empty() {
        return c;
    }
    for v in quad {
        c[0] += v[0];
        c[1] += v[1];
        c[2] += v[2];
    }
    let inv = (quad.len() as f32).recip();
    [c[0] * inv, c[1] * inv, c[2] * inv]
}

/// Midpoint of the two lowest-Y corners; the glyph's baseline pivot.
pub(crate) fn baseline_pivot(quad: &[Vec3; QUAD_VERTS]) -> Vec3 {
    let mut order = [0usize, 1, 2, 3];
    order.sort_by(|a, b| quad[*a][1].total_cmp(&quad[*b][1]));
    let (a, b) = (quad[order[0]], quad[order[1]]);
    [
        (a[0] + b[0]) * 0.5,
        (a[1] + b[1]) * 0.5,
        (a[2] + b[2]) * 0.5,
    ]
}

/// Rotate `p` around `pivot` in the XY plane.
#[inline]
pub(crate) fn rotate_xy(p: Vec3, pivot: Vec3, sin: f32, cos: f32) -> Vec3 {
    let dx = p[0] - pivot[0];
    let dy = p[1] - pivot[1];
    [
        pivot[0] + dx * cos - dy * sin,
        pivot[1] + dx * sin + dy * cos,
        p[2],
    ]
}
