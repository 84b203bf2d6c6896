//! Configuration and authoring bundles for a text-effect component.

use serde::{Deserialize, Serialize};

use crate::entry::{GlobalEffectEntry, TagEffectEntry};
use crate::error::TextEffectError;

pub const MIN_UPDATES_PER_SECOND: u32 = 1;
pub const MAX_UPDATES_PER_SECOND: u32 = 120;

/// Runtime knobs for the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on ticks per second of wall-clock time; clamped to 1..=120.
    pub updates_per_second: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            updates_per_second: 30,
        }
    }
}

impl SchedulerConfig {
    /// Minimum seconds between two processed ticks.
    pub fn min_tick_interval(&self) -> f64 {
        let ups = self
            .updates_per_second
            .clamp(MIN_UPDATES_PER_SECOND, MAX_UPDATES_PER_SECOND);
        1.0 / f64::from(ups)
    }
}

/// Reusable set of tag effects shared between components.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TagEffectsPreset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag_effects: Vec<TagEffectEntry>,
}

/// Everything the authoring layer configures on one text-effect component.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextEffectConfig {
    pub tag_effects: Vec<TagEffectEntry>,
    pub global_effects: Vec<GlobalEffectEntry>,
    pub use_preset: bool,
    pub preset: Option<TagEffectsPreset>,
    pub scheduler: SchedulerConfig,
}

impl TextEffectConfig {
    /// Reject values the scheduler cannot honor (non-finite timing, bad rates).
    pub fn validate(&self) -> Result<(), TextEffectError> {
        if self.scheduler.updates_per_second == 0 {
            return Err(TextEffectError::InvalidConfig {
                reason: "scheduler.updates_per_second must be > 0".into(),
            });
        }
        let preset_effects = self
            .preset
            .iter()
            .flat_map(|p| p.tag_effects.iter())
            .filter_map(|e| e.effect.as_ref());
        let effects = self
            .tag_effects
            .iter()
            .filter_map(|e| e.effect.as_ref())
            .chain(self.global_effects.iter().filter_map(|e| e.effect.as_ref()))
            .chain(preset_effects);
        for effect in effects {
            let t = &effect.timing;
            for (name, value) in [
                ("duration_per_char", t.duration_per_char),
                ("delay_per_char", t.delay_per_char),
                ("fixed_duration", t.fixed_duration),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(TextEffectError::InvalidConfig {
                        reason: format!(
                            "effect '{}': {name} must be finite and >= 0 (got {value})",
                            effect.tag
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate a text-effect component config from JSON.
pub fn parse_text_effect_json(json: &str) -> Result<TextEffectConfig, TextEffectError> {
    let cfg: TextEffectConfig = serde_json::from_str(json)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parse a tag effects preset from JSON.
pub fn parse_preset_json(json: &str) -> Result<TagEffectsPreset, TextEffectError> {
    let preset: TagEffectsPreset = serde_json::from_str(json)?;
    let wrapper = TextEffectConfig {
        preset: Some(preset),
        ..Default::default()
    };
    wrapper.validate()?;
    Ok(wrapper.preset.unwrap_or_default())
}
