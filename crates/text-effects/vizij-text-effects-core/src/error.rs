//! Error types for the authoring boundary.
//!
//! Only curve construction, config validation and JSON loading can fail. The
//! per-character update loop never produces errors; see `events.rs` for the
//! non-fatal diagnostics emitted while scheduling.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TextEffectError {
    /// Keyframes were empty where a curve needs them, unordered, or non-finite.
    #[error("invalid curve: {reason}")]
    InvalidCurve { reason: String },

    /// A text-effect configuration failed validation.
    #[error("invalid text effect config: {reason}")]
    InvalidConfig { reason: String },

    #[error("text effect json: {0}")]
    Json(#[from] serde_json::Error),
}
