//! CognitiveRouter: pattern-weighted processing of input vectors.
//!
//! The router is the single owner of the thought-pattern weight table.
//! Output generation is delegated to a [`PatternGenerator`]; the default
//! [`ScaledPassthrough`] keeps the input direction and scales it by the
//! current pattern gain, so any blending scheme can be plugged in without
//! touching the weight bookkeeping.

use super::pattern::{ProcessContext, ThoughtPattern, ThoughtType};
use crate::config::HolomemConfig;
use crate::error::Result;
use crate::kernel::{ComputeScopeOptimizer, Vector};
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Upper bound for any pattern intensity after boosting.
pub const MAX_INTENSITY: f64 = 8.0;
/// Upper bound for the global creativity level after boosting.
pub const MAX_CREATIVITY: f64 = 8.0;

/// Read-only copy of the weight table handed to generators.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternWeights {
    patterns: BTreeMap<ThoughtType, ThoughtPattern>,
    creativity_level: f64,
}

impl PatternWeights {
    fn defaults(creativity_level: f64) -> Self {
        Self {
            patterns: ThoughtType::ALL
                .into_iter()
                .map(|t| (t, ThoughtPattern::default_for(t)))
                .collect(),
            creativity_level,
        }
    }

    pub fn get(&self, thought_type: ThoughtType) -> ThoughtPattern {
        self.patterns
            .get(&thought_type)
            .copied()
            .unwrap_or_else(|| ThoughtPattern::default_for(thought_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThoughtPattern> {
        self.patterns.values()
    }

    pub fn creativity_level(&self) -> f64 {
        self.creativity_level
    }

    /// Frequency-weighted mean intensity across all patterns.
    pub fn blended_gain(&self) -> f64 {
        let total_frequency: f64 = self.iter().map(|p| p.frequency).sum();
        if total_frequency == 0.0 {
            return 0.0;
        }
        self.iter().map(ThoughtPattern::weight).sum::<f64>() / total_frequency
    }

    /// Gain for a pass that honours `context.forced_pattern`.
    pub fn gain_for(&self, context: &ProcessContext) -> f64 {
        match context.forced_pattern {
            Some(t) => self.get(t).weight(),
            None => self.blended_gain(),
        }
    }
}

/// Turns an input vector into the router's output under the current weights.
pub trait PatternGenerator: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        input: &Vector,
        weights: &PatternWeights,
        context: &ProcessContext,
    ) -> Result<Vector>;
}

/// Scales the input by the active gain. Direction is preserved.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScaledPassthrough;

impl PatternGenerator for ScaledPassthrough {
    fn name(&self) -> &'static str {
        "scaled_passthrough"
    }

    fn generate(
        &self,
        input: &Vector,
        weights: &PatternWeights,
        context: &ProcessContext,
    ) -> Result<Vector> {
        Ok(input.scaled(weights.gain_for(context)))
    }
}

pub struct CognitiveRouter {
    weights: RwLock<PatternWeights>,
    generator: Box<dyn PatternGenerator>,
    optimizer: ComputeScopeOptimizer,
    normalization_rate: f64,
    last_output: RwLock<Option<Vector>>,
}

impl CognitiveRouter {
    /// Router with the default table and a creativity level drawn from [0.5, 1).
    pub fn new(config: &HolomemConfig, optimizer: ComputeScopeOptimizer) -> Self {
        let creativity_level = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)).gen_range(0.5..1.0),
            None => rand::thread_rng().gen_range(0.5..1.0),
        };
        Self {
            weights: RwLock::new(PatternWeights::defaults(creativity_level)),
            generator: Box::new(ScaledPassthrough),
            optimizer,
            normalization_rate: config.normalization_rate,
            last_output: RwLock::new(None),
        }
    }

    pub fn with_generator(mut self, generator: Box<dyn PatternGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Produce an output for `input` inside a compute scope.
    ///
    /// Only plain passes (no forced pattern, no replay timestamp) are
    /// recorded as the last output.
    pub fn process(&self, input: &Vector, context: &ProcessContext) -> Result<Vector> {
        let output = self.optimizer.optimize_computation(|scope| {
            let weights = self.weights();
            let output = self.generator.generate(input, &weights, context)?;
            scope.track(&output);
            Ok(output)
        })?;
        if context.forced_pattern.is_none() && context.timestamp.is_none() {
            *self.last_output.write() = Some(output.clone());
        }
        Ok(output)
    }

    pub fn weights(&self) -> PatternWeights {
        self.weights.read().clone()
    }

    pub fn pattern(&self, thought_type: ThoughtType) -> ThoughtPattern {
        self.weights.read().get(thought_type)
    }

    pub fn patterns(&self) -> Vec<ThoughtPattern> {
        self.weights.read().iter().copied().collect()
    }

    pub fn creativity_level(&self) -> f64 {
        self.weights.read().creativity_level
    }

    /// Output of the most recent plain `process` call.
    pub fn last_output(&self) -> Option<Vector> {
        self.last_output.read().clone()
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub(crate) fn boost_creativity(&self, factor: f64) {
        let mut weights = self.weights.write();
        weights.creativity_level = (weights.creativity_level * factor).min(MAX_CREATIVITY);
        debug!(
            factor,
            creativity_level = weights.creativity_level,
            "creativity boosted"
        );
    }

    pub(crate) fn boost_pattern(&self, thought_type: ThoughtType, factor: f64) {
        let mut weights = self.weights.write();
        if let Some(pattern) = weights.patterns.get_mut(&thought_type) {
            pattern.intensity = (pattern.intensity * factor).min(MAX_INTENSITY);
            debug!(
                pattern = %thought_type,
                factor,
                intensity = pattern.intensity,
                "pattern boosted"
            );
        }
    }

    /// Pull every intensity part of the way back to its default.
    pub(crate) fn normalize_thinking(&self) {
        let rate = self.normalization_rate;
        let mut weights = self.weights.write();
        for pattern in weights.patterns.values_mut() {
            let (default_intensity, _) = pattern.thought_type.default_weights();
            pattern.intensity += (default_intensity - pattern.intensity) * rate;
        }
        debug!(rate, "thinking normalized toward defaults");
    }
}

impl fmt::Debug for CognitiveRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CognitiveRouter")
            .field("generator", &self.generator.name())
            .field("creativity_level", &self.creativity_level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HolomemError;
    use crate::kernel::Similarity;

    fn router() -> CognitiveRouter {
        let config = HolomemConfig {
            dimensions: 16,
            seed: Some(3),
            ..HolomemConfig::default()
        };
        CognitiveRouter::new(&config, ComputeScopeOptimizer::from_config(&config))
    }

    #[test]
    fn test_initial_table_matches_defaults() {
        let r = router();
        for t in ThoughtType::ALL {
            assert_eq!(r.pattern(t), ThoughtPattern::default_for(t));
        }
        let c = r.creativity_level();
        assert!((0.5..1.0).contains(&c));
    }

    #[test]
    fn test_process_preserves_direction() {
        let r = router();
        let input = Vector::from_data((0..16).map(|i| i as f64 - 7.5).collect());
        let out = r.process(&input, &ProcessContext::default()).unwrap();
        assert!((Similarity::cosine(&input, &out).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(r.last_output(), Some(out));
    }

    #[test]
    fn test_forced_pattern_uses_its_weight() {
        let r = router();
        let input = Vector::from_data(vec![1.0; 16]);
        let out = r
            .process(&input, &ProcessContext::forced(ThoughtType::Concrete))
            .unwrap();
        // concrete: intensity 0.8 * frequency 1.0
        assert!((out[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_forced_and_replay_passes_leave_last_output() {
        let r = router();
        let input = Vector::from_data(vec![1.0; 16]);
        let plain = r.process(&input, &ProcessContext::default()).unwrap();
        r.process(&input, &ProcessContext::forced(ThoughtType::Metacognitive))
            .unwrap();
        r.process(&plain, &ProcessContext::at(99)).unwrap();
        assert_eq!(r.last_output(), Some(plain));
    }

    #[test]
    fn test_process_is_deterministic() {
        let r = router();
        let input = Vector::from_data(vec![0.25; 16]);
        let a = r.process(&input, &ProcessContext::default()).unwrap();
        let b = r.process(&input, &ProcessContext::at(1234)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_boost_pattern() {
        let r = router();
        r.boost_pattern(ThoughtType::Abstract, 1.2);
        assert!((r.pattern(ThoughtType::Abstract).intensity - 1.32).abs() < 1e-12);
        assert_eq!(r.pattern(ThoughtType::Abstract).frequency, 0.6);
        assert_eq!(
            r.pattern(ThoughtType::Critical),
            ThoughtPattern::default_for(ThoughtType::Critical)
        );
    }

    #[test]
    fn test_boosts_are_bounded() {
        let r = router();
        for _ in 0..200 {
            r.boost_pattern(ThoughtType::Divergent, 1.2);
            r.boost_creativity(1.2);
        }
        assert_eq!(r.pattern(ThoughtType::Divergent).intensity, MAX_INTENSITY);
        assert_eq!(r.creativity_level(), MAX_CREATIVITY);
    }

    #[test]
    fn test_boost_creativity() {
        let r = router();
        let before = r.creativity_level();
        r.boost_creativity(1.2);
        assert!((r.creativity_level() - before * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_thinking_moves_toward_defaults() {
        let r = router();
        r.boost_pattern(ThoughtType::Divergent, 2.0);
        let boosted = r.pattern(ThoughtType::Divergent).intensity;
        r.normalize_thinking();
        let after = r.pattern(ThoughtType::Divergent).intensity;
        assert!(after < boosted);
        assert!((after - (1.2 + (boosted - 1.2) * 0.5)).abs() < 1e-12);
        // Patterns already at their default stay put.
        assert_eq!(r.pattern(ThoughtType::Systems).intensity, 1.0);
    }

    #[derive(Debug)]
    struct Failing;

    impl PatternGenerator for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn generate(&self, _: &Vector, _: &PatternWeights, _: &ProcessContext) -> Result<Vector> {
            Err(HolomemError::EmptyInput("no pattern".into()))
        }
    }

    #[test]
    fn test_generator_errors_release_scope() {
        let optimizer = ComputeScopeOptimizer::default();
        let r = CognitiveRouter::new(&HolomemConfig::default(), optimizer.clone())
            .with_generator(Box::new(Failing));
        assert!(r.process(&Vector::zeros(4), &ProcessContext::default()).is_err());
        assert_eq!(optimizer.stats().open_scopes(), 0);
        assert_eq!(r.last_output(), None);
        assert_eq!(r.generator_name(), "failing");
    }
}
