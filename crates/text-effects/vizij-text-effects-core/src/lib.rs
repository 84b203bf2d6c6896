//! Vizij Text Effects Core (engine-agnostic)
//!
//! Per-glyph animation for laid-out text. A host hands the scheduler a
//! [`TextInfo`] snapshot (character quads, colours, tag annotations); effect
//! instances stagger their timing per character and mutate the quads in
//! place. Layout-time warps (curve follow) run once per rebuild and again at
//! the start of every frame; time-driven effects are composed on top in a
//! fixed order so output only depends on configuration, time and input.

pub mod clock;
pub mod component;
pub mod config;
pub mod curve;
pub mod effects;
pub mod entry;
pub mod error;
pub mod events;
pub mod ids;
pub mod instance;
pub mod interp;
pub mod scheduler;
pub mod text;
pub mod timing;

// Re-exports for hosts and adapters
pub use clock::{Clock, ManualClock, SystemClock};
pub use component::{TextEffect, TextSource};
pub use config::{
    parse_preset_json, parse_text_effect_json, SchedulerConfig, TagEffectsPreset,
    TextEffectConfig,
};
pub use curve::{resolve_axis_curve, Curve, Keyframe, WrapMode};
pub use effects::{
    ColorEffect, CurveFollowEffect, Effect, EffectKind, FadeEffect, MoveEffect, RotateEffect,
    RotatePivot, ScaleEffect, SourceCache,
};
pub use entry::{
    effective_trigger, EffectScope, GlobalEffectEntry, ScheduledEntry, TagEffectEntry,
    TriggerBuckets, TriggerWhen,
};
pub use error::TextEffectError;
pub use events::{EffectStatus, FrameOutputs, FrameStatus, RebuildReport, TextEffectEvent};
pub use ids::EntryId;
pub use instance::{EffectInstance, ProgressView, ALL_VERTICES};
pub use scheduler::TextEffectScheduler;
pub use text::{CharacterInfo, LinkSpan, MeshPartition, Rgba8, TextInfo, Vec3};
pub use timing::{AnimationType, EffectTiming, Playback};
