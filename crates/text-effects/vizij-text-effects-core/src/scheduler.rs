//! TextEffectScheduler: trigger buckets, lifecycle and per-frame composition.
//!
//! Structural changes (new text, new annotations, edited templates) rebuild
//! every bucket from scratch. Bucket membership is the only lifecycle signal:
//! entries are armed when a rebuild places them, and dropped by the next one.
//!
//! Composition order for one visible character:
//!   OnStart global (non-override) -> Manual global (non-override)
//!   -> OnStart tag -> Manual tag
//!   -> OnStart global (override) -> Manual global (override)
//! Each step reads the buffer left by the previous one.

use hashbrown::HashMap;

use crate::clock::{Clock, SystemClock};
use crate::config::{SchedulerConfig, TagEffectsPreset, TextEffectConfig};
use crate::entry::{
    EffectScope, GlobalEffectEntry, ScheduledEntry, TagEffectEntry, TriggerBuckets, TriggerWhen,
};
use crate::events::{EffectStatus, FrameOutputs, FrameStatus, RebuildReport, TextEffectEvent};
use crate::ids::IdAllocator;
use crate::instance::ALL_VERTICES;
use crate::text::{LinkSpan, TextInfo};

/// Separator between effect names inside one annotation.
pub const TAG_SEPARATOR: char = '+';

pub struct TextEffectScheduler {
    config: TextEffectConfig,
    clock: Box<dyn Clock>,
    ids: IdAllocator,

    global: TriggerBuckets,
    tags: TriggerBuckets,

    next_update_time: f64,
    dirty: bool,
    /// Events raised outside rebuild/tick, delivered with the next report.
    pending_events: Vec<TextEffectEvent>,
}

impl std::fmt::Debug for TextEffectScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEffectScheduler")
            .field("config", &self.config)
            .field("global", &self.global)
            .field("tags", &self.tags)
            .field("next_update_time", &self.next_update_time)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl TextEffectScheduler {
    pub fn new(config: TextEffectConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            ids: IdAllocator::new(),
            global: TriggerBuckets::default(),
            tags: TriggerBuckets::default(),
            next_update_time: f64::NEG_INFINITY,
            dirty: true,
            pending_events: Vec::new(),
        }
    }

    /// Scheduler on the process monotonic clock.
    pub fn with_system_clock(config: TextEffectConfig) -> Self {
        Self::new(config, Box::new(SystemClock::new()))
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn config(&self) -> &TextEffectConfig {
        &self.config
    }

    /// Replace the authoring config; buckets rebuild on the next refresh.
    pub fn set_config(&mut self, config: TextEffectConfig) {
        self.config = config;
        self.mark_dirty();
    }

    pub fn set_global_effects(&mut self, entries: Vec<GlobalEffectEntry>) {
        self.config.global_effects = entries;
        self.mark_dirty();
    }

    pub fn set_tag_effects(&mut self, entries: Vec<TagEffectEntry>) {
        self.config.tag_effects = entries;
        self.mark_dirty();
    }

    pub fn set_preset(&mut self, preset: Option<TagEffectsPreset>, use_preset: bool) {
        self.config.preset = preset;
        self.config.use_preset = use_preset;
        self.mark_dirty();
    }

    /// Takes effect on the next tick, which runs immediately.
    pub fn set_scheduler_config(&mut self, scheduler: SchedulerConfig) {
        self.config.scheduler = scheduler;
        self.next_update_time = f64::NEG_INFINITY;
    }

    /// Flag that text, annotations or templates changed.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the next `tick` would run rather than be rate limited.
    #[inline]
    pub fn is_due(&self) -> bool {
        self.clock.now() >= self.next_update_time
    }

    pub fn buckets(&self, scope: EffectScope) -> &TriggerBuckets {
        match scope {
            EffectScope::Global => &self.global,
            EffectScope::Tag => &self.tags,
        }
    }

    /// Drain events raised by runtime API calls since the last report.
    pub fn take_events(&mut self) -> Vec<TextEffectEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Rebuild all buckets for `text`, run layout effects once, then arm OnStart entries.
    pub fn rebuild(&mut self, text: &mut TextInfo) -> RebuildReport {
        let now = self.clock.now();
        let mut events = std::mem::take(&mut self.pending_events);

        self.global = copy_global_effects(
            &self.config.global_effects,
            text.character_count(),
            &mut self.ids,
        );
        let preset_entries = self
            .config
            .preset
            .as_ref()
            .filter(|_| self.config.use_preset)
            .map(|p| p.tag_effects.as_slice())
            .unwrap_or(&[]);
        let templates: Vec<&TagEffectEntry> = self
            .config
            .tag_effects
            .iter()
            .chain(preset_entries.iter())
            .collect();
        self.tags = add_tag_effects(&templates, &text.links, &mut self.ids, &mut events);

        for entry in self.global.on_awake.iter_mut().chain(self.tags.on_awake.iter_mut()) {
            entry.start(now);
        }
        let awake_applied = self.apply_awake_effects(text, now);
        self.start_on_start_effects_at(now);
        self.dirty = false;

        log::debug!(
            "text effects rebuilt: {} global, {} tag entries, {} links",
            self.global.len(),
            self.tags.len(),
            text.links.len()
        );

        RebuildReport {
            awake_applied,
            events,
        }
    }

    /// Apply layout effects over every visible character.
    ///
    /// Returns false when there are no layout effects.
    fn apply_awake_effects(&mut self, text: &mut TextInfo, now: f64) -> bool {
        if self.global.on_awake.is_empty() && self.tags.on_awake.is_empty() {
            return false;
        }
        for entry in self.global.on_awake.iter_mut().chain(self.tags.on_awake.iter_mut()) {
            entry.instance.prepare(text);
        }
        for i in 0..text.character_count() {
            if !text.is_visible(i) {
                continue;
            }
            for entry in self.global.on_awake.iter_mut() {
                if !entry.override_tag_effects {
                    entry.instance.apply(text, i, ALL_VERTICES, now);
                }
            }
            for entry in self.tags.on_awake.iter_mut() {
                entry.instance.apply(text, i, ALL_VERTICES, now);
            }
            for entry in self.global.on_awake.iter_mut() {
                if entry.override_tag_effects {
                    entry.instance.apply(text, i, ALL_VERTICES, now);
                }
            }
        }
        true
    }

    /// Per-frame update. Skipped entirely while rate limited.
    ///
    /// `text` must hold fresh layout geometry; effects accumulate on top of it.
    pub fn tick(&mut self, text: &mut TextInfo) -> FrameOutputs {
        let now = self.clock.now();
        let mut out = FrameOutputs {
            status: FrameStatus::Skipped,
            events: std::mem::take(&mut self.pending_events),
        };
        if now < self.next_update_time {
            log::trace!("text effect tick skipped at {now:.4}");
            return out;
        }
        self.next_update_time = now + self.config.scheduler.min_tick_interval();

        for entry in self.global.iter_mut().chain(self.tags.iter_mut()) {
            if entry.instance.rewind_fixed_cycle(now) {
                entry.completion_reported = false;
            }
        }

        self.apply_awake_effects(text, now);

        for i in 0..text.character_count() {
            if !text.is_visible(i) {
                continue;
            }
            self.compose_character(text, i, now);
        }

        self.collect_completions(now, &mut out);
        out.status = FrameStatus::Applied;
        out
    }

    fn compose_character(&mut self, text: &mut TextInfo, i: usize, now: f64) {
        let global = &mut self.global;
        let tags = &mut self.tags;
        for entry in global.on_start.iter_mut().chain(global.manual.iter_mut()) {
            if !entry.override_tag_effects {
                entry.instance.apply(text, i, ALL_VERTICES, now);
            }
        }
        for entry in tags.on_start.iter_mut().chain(tags.manual.iter_mut()) {
            entry.instance.apply(text, i, ALL_VERTICES, now);
        }
        for entry in global.on_start.iter_mut().chain(global.manual.iter_mut()) {
            if entry.override_tag_effects {
                entry.instance.apply(text, i, ALL_VERTICES, now);
            }
        }
    }

    fn collect_completions(&mut self, now: f64, out: &mut FrameOutputs) {
        for entry in self.global.iter_mut().chain(self.tags.iter_mut()) {
            if entry.completion_reported || !entry.instance.is_complete(now) {
                continue;
            }
            entry.completion_reported = true;
            out.push_event(TextEffectEvent::EffectCompleted {
                entry: entry.id,
                tag: entry.tag().to_string(),
                scope: entry.scope,
                trigger: entry.trigger_when,
            });
        }
    }
}

// Runtime API.
impl TextEffectScheduler {
    pub fn stop_all_effects(&mut self) {
        for entry in self.global.iter_mut().chain(self.tags.iter_mut()) {
            entry.stop();
        }
    }

    /// Arm OnStart entries and let the next tick run immediately.
    pub fn start_on_start_effects(&mut self) {
        let now = self.clock.now();
        self.start_on_start_effects_at(now);
    }

    fn start_on_start_effects_at(&mut self, now: f64) {
        for entry in self.global.on_start.iter_mut().chain(self.tags.on_start.iter_mut()) {
            entry.start(now);
        }
        self.next_update_time = f64::NEG_INFINITY;
    }

    pub fn stop_on_start_effects(&mut self) {
        for entry in self.global.on_start.iter_mut().chain(self.tags.on_start.iter_mut()) {
            entry.stop();
        }
    }

    pub fn start_manual_effects(&mut self) {
        let now = self.clock.now();
        self.global.manual.iter_mut().for_each(|e| e.start(now));
    }

    pub fn stop_manual_effects(&mut self) {
        self.global.manual.iter_mut().for_each(ScheduledEntry::stop);
    }

    pub fn start_manual_tag_effects(&mut self) {
        let now = self.clock.now();
        self.tags.manual.iter_mut().for_each(|e| e.start(now));
    }

    pub fn stop_manual_tag_effects(&mut self) {
        self.tags.manual.iter_mut().for_each(ScheduledEntry::stop);
    }

    pub fn find_manual_effect(&self, tag: &str) -> Option<&ScheduledEntry> {
        self.global.manual.iter().find(|e| e.tag() == tag)
    }

    /// Start the first global manual entry tagged `tag`.
    ///
    /// Unknown tags are reported as a warning event; returns whether one started.
    pub fn start_manual_effect(&mut self, tag: &str) -> bool {
        self.start_manual_in(EffectScope::Global, tag)
    }

    /// Start the first tag-scoped manual entry tagged `tag`.
    pub fn start_manual_tag_effect(&mut self, tag: &str) -> bool {
        self.start_manual_in(EffectScope::Tag, tag)
    }

    fn start_manual_in(&mut self, scope: EffectScope, tag: &str) -> bool {
        let now = self.clock.now();
        let bucket = match scope {
            EffectScope::Global => &mut self.global.manual,
            EffectScope::Tag => &mut self.tags.manual,
        };
        if let Some(entry) = bucket.iter_mut().find(|e| e.tag() == tag) {
            entry.start(now);
            return true;
        }
        let available: Vec<String> = bucket.iter().map(|e| e.tag().to_string()).collect();
        log::warn!(
            "Effect {tag} not found. Available effects: {}",
            available.join(", ")
        );
        self.pending_events.push(TextEffectEvent::ManualEffectNotFound {
            name: tag.to_string(),
            scope,
            available,
        });
        false
    }

    pub fn query_effect_statuses(
        &self,
        scope: EffectScope,
        trigger: TriggerWhen,
    ) -> Vec<EffectStatus> {
        let now = self.clock.now();
        self.buckets(scope)
            .get(trigger)
            .iter()
            .map(|e| status_of(e, now))
            .collect()
    }

    pub fn query_effect_statuses_by_tag(
        &self,
        scope: EffectScope,
        trigger: TriggerWhen,
        tag: &str,
    ) -> Vec<EffectStatus> {
        let now = self.clock.now();
        self.buckets(scope)
            .get(trigger)
            .iter()
            .filter(|e| e.tag() == tag)
            .map(|e| status_of(e, now))
            .collect()
    }
}

fn status_of(entry: &ScheduledEntry, now: f64) -> EffectStatus {
    EffectStatus {
        tag: entry.tag().to_string(),
        started: entry.instance.is_started(),
        is_complete: entry.instance.is_complete(now),
    }
}

/// Clone every global template into a whole-text instance, bucketed by trigger.
fn copy_global_effects(
    templates: &[GlobalEffectEntry],
    char_count: usize,
    ids: &mut IdAllocator,
) -> TriggerBuckets {
    let mut buckets = TriggerBuckets::default();
    for template in templates {
        let Some(effect) = template.effect.as_ref() else {
            continue;
        };
        buckets.push(ScheduledEntry::new(
            ids.alloc_entry(),
            EffectScope::Global,
            template.trigger_when,
            template.override_tag_effects,
            effect.instantiate(0, char_count),
        ));
    }
    buckets
}

/// Resolve every annotation to tag templates and clone them over its span.
///
/// Names are matched exactly; zero matches skip the name, several matches use
/// the first registered template. Both cases are reported, neither is fatal.
fn add_tag_effects(
    templates: &[&TagEffectEntry],
    links: &[LinkSpan],
    ids: &mut IdAllocator,
    events: &mut Vec<TextEffectEvent>,
) -> TriggerBuckets {
    let mut index: HashMap<&str, (&TagEffectEntry, usize)> = HashMap::new();
    for &template in templates {
        let Some(effect) = template.effect.as_ref() else {
            continue;
        };
        index
            .entry(effect.tag.as_str())
            .and_modify(|(_, count)| *count += 1)
            .or_insert((template, 1));
    }

    let mut buckets = TriggerBuckets::default();
    for link in links {
        if link.id.is_empty() {
            continue;
        }
        for name in link.id.split(TAG_SEPARATOR) {
            let Some(&(template, matches)) = index.get(name) else {
                log::warn!("Effect not found: {name}");
                events.push(TextEffectEvent::EffectNotFound {
                    name: name.to_string(),
                });
                continue;
            };
            if matches > 1 {
                log::warn!("Multiple effects found: {name} ({matches} templates, using the first)");
                events.push(TextEffectEvent::AmbiguousEffect {
                    name: name.to_string(),
                    matches,
                });
            }
            let Some(effect) = template.effect.as_ref() else {
                continue;
            };
            buckets.push(ScheduledEntry::new(
                ids.alloc_entry(),
                EffectScope::Tag,
                template.trigger_when,
                false,
                effect.instantiate(link.first_char_index, link.length),
            ));
        }
    }
    buckets
}
