//! Effect entries: authoring-side bindings and their live scheduled copies.

use serde::{Deserialize, Serialize};

use crate::effects::{Effect, EffectKind};
use crate::ids::EntryId;
use crate::instance::EffectInstance;

/// When an entry is armed.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerWhen {
    /// During layout, before the first visible frame. Reserved for layout effects.
    OnAwake,
    #[default]
    OnStart,
    Manual,
}

/// Trigger an entry actually runs with.
///
/// Layout effects always run during layout; everything else can never be
/// placed there and falls back to `OnStart`.
pub fn effective_trigger(kind: &EffectKind, configured: TriggerWhen) -> TriggerWhen {
    if kind.plays_during_layout() {
        TriggerWhen::OnAwake
    } else if configured == TriggerWhen::OnAwake {
        TriggerWhen::OnStart
    } else {
        configured
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectScope {
    /// Spans the whole text.
    Global,
    /// Bound to characters of a tag annotation.
    Tag,
}

/// A template effect bound to tag annotations by `effect.tag`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TagEffectEntry {
    #[serde(default)]
    pub effect: Option<Effect>,
    #[serde(default)]
    pub trigger_when: TriggerWhen,
}

impl TagEffectEntry {
    pub fn new(effect: Effect, trigger_when: TriggerWhen) -> Self {
        Self {
            effect: Some(effect),
            trigger_when,
        }
    }
}

/// A template effect spanning the whole text.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalEffectEntry {
    #[serde(default)]
    pub effect: Option<Effect>,
    #[serde(default)]
    pub trigger_when: TriggerWhen,
    /// Applied after tag effects so it wins over them.
    #[serde(default)]
    pub override_tag_effects: bool,
}

impl GlobalEffectEntry {
    pub fn new(effect: Effect, trigger_when: TriggerWhen) -> Self {
        Self {
            effect: Some(effect),
            trigger_when,
            override_tag_effects: false,
        }
    }

    pub fn overriding(mut self) -> Self {
        self.override_tag_effects = true;
        self
    }
}

/// Live entry owned by a scheduler bucket until the next rebuild.
#[derive(Clone, Debug)]
pub struct ScheduledEntry {
    pub id: EntryId,
    pub scope: EffectScope,
    pub trigger_when: TriggerWhen,
    pub override_tag_effects: bool,
    pub instance: EffectInstance,
    /// Set once the completion event for the current run has been emitted.
    pub(crate) completion_reported: bool,
}

impl ScheduledEntry {
    pub(crate) fn new(
        id: EntryId,
        scope: EffectScope,
        configured: TriggerWhen,
        override_tag_effects: bool,
        instance: EffectInstance,
    ) -> Self {
        let trigger_when = effective_trigger(&instance.effect().kind, configured);
        Self {
            id,
            scope,
            trigger_when,
            override_tag_effects,
            instance,
            completion_reported: false,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.instance.start(now);
        self.completion_reported = false;
    }

    pub fn stop(&mut self) {
        self.instance.stop();
    }

    #[inline]
    pub fn tag(&self) -> &str {
        self.instance.tag()
    }
}

/// Entries partitioned by trigger.
#[derive(Clone, Debug, Default)]
pub struct TriggerBuckets {
    pub on_awake: Vec<ScheduledEntry>,
    pub on_start: Vec<ScheduledEntry>,
    pub manual: Vec<ScheduledEntry>,
}

impl TriggerBuckets {
    pub fn push(&mut self, entry: ScheduledEntry) {
        match entry.trigger_when {
            TriggerWhen::OnAwake => self.on_awake.push(entry),
            TriggerWhen::OnStart => self.on_start.push(entry),
            TriggerWhen::Manual => self.manual.push(entry),
        }
    }

    pub fn get(&self, trigger: TriggerWhen) -> &[ScheduledEntry] {
        match trigger {
            TriggerWhen::OnAwake => &self.on_awake,
            TriggerWhen::OnStart => &self.on_start,
            TriggerWhen::Manual => &self.manual,
        }
    }

    pub fn get_mut(&mut self, trigger: TriggerWhen) -> &mut Vec<ScheduledEntry> {
        match trigger {
            TriggerWhen::OnAwake => &mut self.on_awake,
            TriggerWhen::OnStart => &mut self.on_start,
            TriggerWhen::Manual => &mut self.manual,
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScheduledEntry> {
        self.on_awake
            .iter_mut()
            .chain(self.on_start.iter_mut())
            .chain(self.manual.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.on_awake.len() + self.on_start.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
