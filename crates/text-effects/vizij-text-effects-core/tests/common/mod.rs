//! Glyph layouts and a scripted layout collaborator shared by integration tests.
#![allow(dead_code)]

use vizij_text_effects::{CharacterInfo, LinkSpan, MeshPartition, TextInfo, TextSource, Vec3};

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

pub fn approx_vec3(a: Vec3, b: Vec3, eps: f32) {
    for axis in 0..3 {
        assert!(
            (a[axis] - b[axis]).abs() <= eps,
            "axis {axis}: left={a:?} right={b:?} eps={eps}"
        );
    }
}

/// Corners in bottom-left, top-left, top-right, bottom-right order.
pub fn quad(x0: f32, x1: f32, y0: f32, y1: f32) -> [Vec3; 4] {
    [[x0, y0, 0.0], [x0, y1, 0.0], [x1, y1, 0.0], [x1, y0, 0.0]]
}

/// One visible glyph per `(x0, x1)` span on a single partition.
pub fn layout_spans(spans: &[(f32, f32)], height: f32) -> TextInfo {
    let mut mesh = MeshPartition::default();
    let mut characters = Vec::with_capacity(spans.len());
    for &(x0, x1) in spans {
        let corners = quad(x0, x1, 0.0, height);
        characters.push(CharacterInfo {
            is_visible: true,
            vertex_index: mesh.vertices.len(),
            material_index: 0,
            bottom_left: corners[0],
            top_right: corners[2],
        });
        mesh.vertices.extend_from_slice(&corners);
        mesh.colors.extend_from_slice(&[WHITE; 4]);
    }
    TextInfo {
        characters,
        meshes: vec![mesh],
        links: Vec::new(),
        generation: 1,
    }
}

/// Monospaced line; whitespace is laid out but invisible.
pub fn layout_line(text: &str, advance: f32) -> TextInfo {
    let spans: Vec<(f32, f32)> = (0..text.chars().count())
        .map(|i| (i as f32 * advance, (i as f32 + 0.8) * advance))
        .collect();
    let mut info = layout_spans(&spans, advance);
    for (c, ch) in info.characters.iter_mut().zip(text.chars()) {
        c.is_visible = !ch.is_whitespace();
    }
    info
}

/// Same line split across two partitions: even glyphs on 0, odd on 1.
pub fn layout_two_partitions(count: usize, advance: f32) -> TextInfo {
    let mut meshes = vec![MeshPartition::default(), MeshPartition::default()];
    let mut characters = Vec::with_capacity(count);
    for i in 0..count {
        let x0 = i as f32 * advance;
        let corners = quad(x0, x0 + advance * 0.8, 0.0, advance);
        let mesh = &mut meshes[i % 2];
        characters.push(CharacterInfo {
            is_visible: true,
            vertex_index: mesh.vertices.len(),
            material_index: i % 2,
            bottom_left: corners[0],
            top_right: corners[2],
        });
        mesh.vertices.extend_from_slice(&corners);
        mesh.colors.extend_from_slice(&[WHITE; 4]);
    }
    TextInfo {
        characters,
        meshes,
        links: Vec::new(),
        generation: 1,
    }
}

pub fn link(id: &str, first_char_index: usize, length: usize) -> LinkSpan {
    LinkSpan {
        id: id.to_string(),
        first_char_index,
        length,
    }
}

pub fn with_links(mut info: TextInfo, links: Vec<LinkSpan>) -> TextInfo {
    info.links = links;
    info
}

/// Layout collaborator that restores a fixed layout on every mesh update.
#[derive(Debug)]
pub struct ScriptedSource {
    pub layout: TextInfo,
    pub text: Option<TextInfo>,
    pub mesh_updates: usize,
    pub flushed: Vec<usize>,
}

impl ScriptedSource {
    pub fn new(layout: TextInfo) -> Self {
        Self {
            text: Some(layout.clone()),
            layout,
            mesh_updates: 0,
            flushed: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            layout: TextInfo::default(),
            text: None,
            mesh_updates: 0,
            flushed: Vec::new(),
        }
    }

    /// Swap in a new layout, as a re-layout after a text edit would.
    pub fn relayout(&mut self, mut layout: TextInfo) {
        layout.generation = self.layout.generation + 1;
        self.layout = layout;
    }

    pub fn current(&self) -> &TextInfo {
        self.text.as_ref().expect("scripted source has text")
    }
}

impl TextSource for ScriptedSource {
    fn force_mesh_update(&mut self) {
        self.mesh_updates += 1;
        if self.text.is_some() {
            self.text = Some(self.layout.clone());
        }
    }

    fn text_info(&mut self) -> Option<&mut TextInfo> {
        self.text.as_mut()
    }

    fn update_geometry(&mut self, partition: usize) {
        self.flushed.push(partition);
    }
}
