//! Configuration for every holomem component.
//!
//! A single [`HolomemConfig`] is built once and handed to the constructors.
//! All fields have defaults, so a partial JSON document is enough:
//!
//! ```rust
//! use holomem::HolomemConfig;
//!
//! let config = HolomemConfig::from_json_str(r#"{"dimensions": 2048, "seed": 7}"#).unwrap();
//! assert_eq!(config.dimensions, 2048);
//! assert_eq!(config.recency_window, 1000);
//! ```

use crate::error::{HolomemError, Result};
use serde::{Deserialize, Serialize};

/// Default personality prompt used when none is configured.
pub const DEFAULT_PERSONALITY_PROMPT: &str =
    "curious, methodical and resourceful; prefers hands-on solutions and keeps a tidy workspace";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HolomemConfig {
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Standard deviation of the Gaussian noise added by the encoder.
    pub noise_level: f64,
    /// Result payload size (KiB) above which compute scopes compress.
    pub memory_limit_kib: usize,
    /// Fraction of elements kept when down-sampling a compressed result.
    pub compression_ratio: f64,
    /// Memories retained by constrained-mode consolidation.
    pub recency_window: usize,
    /// Upper bound on recall results while constrained.
    pub constrained_top_k: usize,
    /// Recall result count when the caller does not choose one.
    pub default_top_k: usize,
    /// Feedback entries kept by the trainer.
    pub history_capacity: usize,
    /// Slice length used by the coherence metric.
    pub coherence_slice: usize,
    /// Starting learning rate of the trainer.
    pub initial_learning_rate: f64,
    /// Fraction of the distance to the defaults removed by `normalize_thinking`.
    pub normalization_rate: f64,
    pub personality_timeout_ms: u64,
    pub sync_timeout_ms: u64,
    /// Seed for noise and router randomness; `None` draws from entropy.
    pub seed: Option<u64>,
    pub personality_prompt: String,
}

impl Default for HolomemConfig {
    fn default() -> Self {
        Self {
            dimensions: 10_000,
            noise_level: 0.1,
            memory_limit_kib: 512,
            compression_ratio: 0.75,
            recency_window: 1000,
            constrained_top_k: 3,
            default_top_k: 5,
            history_capacity: 1000,
            coherence_slice: 100,
            initial_learning_rate: 0.01,
            normalization_rate: 0.5,
            personality_timeout_ms: 5000,
            sync_timeout_ms: 5000,
            seed: None,
            personality_prompt: DEFAULT_PERSONALITY_PROMPT.to_string(),
        }
    }
}

impl HolomemConfig {
    /// Default configuration with a different dimensionality.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document. Unknown keys are rejected.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(HolomemError::Configuration(
                "dimensions must be positive".into(),
            ));
        }
        if !(self.noise_level >= 0.0 && self.noise_level.is_finite()) {
            return Err(HolomemError::Configuration(format!(
                "noise_level must be a non-negative finite number, got {}",
                self.noise_level
            )));
        }
        if !(self.compression_ratio > 0.0 && self.compression_ratio <= 1.0) {
            return Err(HolomemError::Configuration(format!(
                "compression_ratio must be in (0, 1], got {}",
                self.compression_ratio
            )));
        }
        if self.recency_window == 0 || self.history_capacity == 0 {
            return Err(HolomemError::Configuration(
                "recency_window and history_capacity must be positive".into(),
            ));
        }
        if self.coherence_slice == 0 {
            return Err(HolomemError::Configuration(
                "coherence_slice must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.normalization_rate) {
            return Err(HolomemError::Configuration(format!(
                "normalization_rate must be in [0, 1], got {}",
                self.normalization_rate
            )));
        }
        if !(self.initial_learning_rate > 0.0 && self.initial_learning_rate.is_finite()) {
            return Err(HolomemError::Configuration(
                "initial_learning_rate must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Payload limit in bytes.
    pub fn memory_limit_bytes(&self) -> usize {
        self.memory_limit_kib * 1024
    }
}
