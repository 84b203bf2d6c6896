//! Host-facing component tying a scheduler to a text layout collaborator.
//!
//! Entry points take `&self`. A collaborator callback (`force_mesh_update`,
//! `update_geometry`) may hold a handle to the component and call back in;
//! such nested refresh/update calls return `None` instead of recursing.

use std::cell::{Cell, RefCell};

use crate::clock::Clock;
use crate::config::TextEffectConfig;
use crate::events::{FrameOutputs, FrameStatus, RebuildReport};
use crate::scheduler::TextEffectScheduler;
use crate::text::TextInfo;

/// Layout collaborator that owns the glyph geometry.
pub trait TextSource {
    /// Regenerate layout geometry, discarding any effect output.
    fn force_mesh_update(&mut self);

    /// Current layout snapshot; `None` when there is no text to animate.
    fn text_info(&mut self) -> Option<&mut TextInfo>;

    /// Upload the vertex and colour buffers of one mesh partition.
    fn update_geometry(&mut self, partition: usize);
}

/// Clears the in-progress flag on drop, including on unwind.
struct InProgress<'a>(&'a Cell<bool>);

impl<'a> InProgress<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct TextEffect {
    scheduler: RefCell<TextEffectScheduler>,
    in_progress: Cell<bool>,
    dirty_requested: Cell<bool>,
}

impl TextEffect {
    pub fn new(config: TextEffectConfig, clock: Box<dyn Clock>) -> Self {
        Self::from_scheduler(TextEffectScheduler::new(config, clock))
    }

    pub fn from_scheduler(scheduler: TextEffectScheduler) -> Self {
        Self {
            scheduler: RefCell::new(scheduler),
            in_progress: Cell::new(false),
            dirty_requested: Cell::new(false),
        }
    }

    /// Request a rebuild on the next update. Safe to call from callbacks.
    pub fn mark_dirty(&self) {
        self.dirty_requested.set(true);
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_progress.get()
    }

    /// Run `f` against the scheduler unless a refresh/update is in progress.
    pub fn with_scheduler<R>(&self, f: impl FnOnce(&mut TextEffectScheduler) -> R) -> Option<R> {
        if self.in_progress.get() {
            return None;
        }
        let mut scheduler = self.scheduler.try_borrow_mut().ok()?;
        Some(f(&mut scheduler))
    }

    /// Regenerate layout and rebuild all effect buckets.
    pub fn refresh(&self, source: &mut dyn TextSource) -> Option<RebuildReport> {
        let _guard = InProgress::enter(&self.in_progress)?;
        self.refresh_inner(source)
    }

    fn refresh_inner(&self, source: &mut dyn TextSource) -> Option<RebuildReport> {
        source.force_mesh_update();
        let (report, partitions) = {
            let text = source.text_info()?;
            let mut scheduler = self.scheduler.try_borrow_mut().ok()?;
            // A request stays pending until a rebuild actually ran.
            self.dirty_requested.set(false);
            (scheduler.rebuild(text), text.meshes.len())
        };
        if report.awake_applied {
            flush_geometry(source, partitions);
        }
        Some(report)
    }

    /// Per-frame entry point.
    ///
    /// Rebuilds first when dirty. Rate-limited frames leave the source
    /// untouched and report `FrameStatus::Skipped`.
    pub fn update(&self, source: &mut dyn TextSource) -> Option<FrameOutputs> {
        let _guard = InProgress::enter(&self.in_progress)?;

        let mut carried = Vec::new();
        let dirty = self.dirty_requested.get() || self.scheduler.try_borrow().ok()?.is_dirty();
        if dirty {
            if let Some(report) = self.refresh_inner(source) {
                carried = report.events;
            }
        }

        {
            let mut scheduler = self.scheduler.try_borrow_mut().ok()?;
            if !scheduler.is_due() {
                carried.extend(scheduler.take_events());
                return Some(FrameOutputs {
                    status: FrameStatus::Skipped,
                    events: carried,
                });
            }
        }

        source.force_mesh_update();
        let (mut outputs, partitions) = {
            let text = source.text_info()?;
            let mut scheduler = self.scheduler.try_borrow_mut().ok()?;
            (scheduler.tick(text), text.meshes.len())
        };
        if outputs.applied() {
            flush_geometry(source, partitions);
        }
        carried.append(&mut outputs.events);
        outputs.events = carried;
        Some(outputs)
    }
}

impl std::fmt::Debug for TextEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEffect")
            .field("in_progress", &self.in_progress.get())
            .field("dirty_requested", &self.dirty_requested.get())
            .finish_non_exhaustive()
    }
}

fn flush_geometry(source: &mut dyn TextSource, partitions: usize) {
    for partition in 0..partitions {
        source.update_geometry(partition);
    }
}
