//! Cognition layer: thought patterns, routing, and self-training.
//!
//! - [`CognitiveRouter`] owns the thought-pattern weight table and turns
//!   inputs into outputs through a pluggable [`PatternGenerator`].
//! - [`FeedbackTrainer`] scores router output, keeps a bounded training
//!   history, and adapts the router's weights from it.

pub mod pattern;
pub mod router;
pub mod trainer;

pub use pattern::{ProcessContext, ThoughtPattern, ThoughtType};
pub use router::{
    CognitiveRouter, PatternGenerator, PatternWeights, ScaledPassthrough, MAX_CREATIVITY,
    MAX_INTENSITY,
};
pub use trainer::{
    FeedbackTrainer, PatternTelemetry, PerformanceInsights, TrainingFeedback, TrainingMetrics,
};
