//! FeedbackTrainer: self-evaluation and adaptation of the router.
//!
//! Each evaluation scores the router's output on five metrics, folds them
//! into a confidence score, measures how every thought pattern would have
//! fared on its own, and then nudges the router:
//!
//! | confidence | learning rate | router |
//! |---|---|---|
//! | < 0.5 | × 1.1 | `boost_creativity(1.2)` |
//! | > 0.8 | × 0.9 | `normalize_thinking()` |
//!
//! Any pattern with effectiveness below 0.5 is additionally boosted by 1.2.

use super::pattern::{ProcessContext, ThoughtType};
use super::router::CognitiveRouter;
use crate::config::HolomemConfig;
use crate::error::Result;
use crate::kernel::{Similarity, Vector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const LOW_CONFIDENCE: f64 = 0.5;
const HIGH_CONFIDENCE: f64 = 0.8;
const LEARNING_RATE_STEP: f64 = 0.1;
const CREATIVITY_BOOST: f64 = 1.2;
const PATTERN_BOOST: f64 = 1.2;
const EFFECTIVENESS_FLOOR: f64 = 0.5;
/// Effectiveness within this distance of the floor counts as on it.
const EFFECTIVENESS_TOLERANCE: f64 = 1e-9;
/// Entries summarised by [`FeedbackTrainer::performance_insights`].
const INSIGHT_WINDOW: usize = 10;

/// Per-evaluation scores, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub creativity: f64,
    pub efficiency: f64,
    pub adaptability: f64,
    pub coherence: f64,
}

impl TrainingMetrics {
    pub const ACCURACY_WEIGHT: f64 = 0.30;
    pub const CREATIVITY_WEIGHT: f64 = 0.20;
    pub const EFFICIENCY_WEIGHT: f64 = 0.15;
    pub const ADAPTABILITY_WEIGHT: f64 = 0.20;
    pub const COHERENCE_WEIGHT: f64 = 0.15;

    /// Clamp every metric into [0, 1].
    pub fn clamped(self) -> Self {
        let c = |x: f64| if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        Self {
            accuracy: c(self.accuracy),
            creativity: c(self.creativity),
            efficiency: c(self.efficiency),
            adaptability: c(self.adaptability),
            coherence: c(self.coherence),
        }
    }

    /// Weighted sum of the metrics.
    pub fn confidence(&self) -> f64 {
        self.accuracy * Self::ACCURACY_WEIGHT
            + self.creativity * Self::CREATIVITY_WEIGHT
            + self.efficiency * Self::EFFICIENCY_WEIGHT
            + self.adaptability * Self::ADAPTABILITY_WEIGHT
            + self.coherence * Self::COHERENCE_WEIGHT
    }
}

/// Outcome of one evaluation. Never modified once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingFeedback {
    pub metrics: TrainingMetrics,
    pub improvements: BTreeMap<ThoughtType, f64>,
    pub confidence_score: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Thought-pattern telemetry row for the persistence collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternTelemetry {
    #[serde(rename = "type")]
    pub thought_type: ThoughtType,
    pub intensity: f64,
    pub frequency: f64,
    pub timestamp: i64,
}

/// Read-only summary of recent training.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceInsights {
    /// Mean confidence of the last ten entries; `None` without history.
    pub average_confidence: Option<f64>,
    pub learning_rate: f64,
    pub sample_count: usize,
    /// Mean effectiveness per pattern over the same window.
    pub pattern_effectiveness: BTreeMap<ThoughtType, f64>,
}

impl fmt::Display for PerformanceInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(average) = self.average_confidence else {
            return writeln!(f, "No training data available");
        };
        writeln!(f, "Average confidence: {:.2}%", average * 100.0)?;
        writeln!(f, "Learning rate: {:.4}", self.learning_rate)?;
        writeln!(f, "Training samples: {}", self.sample_count)?;
        for (thought_type, effectiveness) in &self.pattern_effectiveness {
            writeln!(
                f,
                "{} pattern performance: {:.2}%",
                thought_type,
                effectiveness * 100.0
            )?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FeedbackTrainer {
    router: Arc<CognitiveRouter>,
    learning_rate: f64,
    history: VecDeque<TrainingFeedback>,
    capacity: usize,
    coherence_slice: usize,
    telemetry_enabled: bool,
    telemetry: VecDeque<PatternTelemetry>,
}

impl FeedbackTrainer {
    pub fn new(config: &HolomemConfig, router: Arc<CognitiveRouter>) -> Self {
        Self {
            router,
            learning_rate: config.initial_learning_rate,
            history: VecDeque::with_capacity(config.history_capacity),
            capacity: config.history_capacity,
            coherence_slice: config.coherence_slice,
            telemetry_enabled: true,
            telemetry: VecDeque::new(),
        }
    }

    pub fn router(&self) -> &Arc<CognitiveRouter> {
        &self.router
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn history(&self) -> &VecDeque<TrainingFeedback> {
        &self.history
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_telemetry_enabled(&mut self, enabled: bool) {
        self.telemetry_enabled = enabled;
    }

    /// Score the router on `input` against `expected_output`, record the
    /// feedback and adapt.
    pub fn evaluate_performance(
        &mut self,
        input: &Vector,
        expected_output: &Vector,
    ) -> Result<TrainingFeedback> {
        let output = self.router.process(input, &ProcessContext::default())?;

        let metrics = self.calculate_metrics(&output, expected_output)?;
        let improvements = self.analyze_thought_patterns(input, &output)?;
        let confidence_score = metrics.confidence();

        let feedback = TrainingFeedback {
            metrics,
            improvements,
            confidence_score,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        debug!(
            accuracy = metrics.accuracy,
            creativity = metrics.creativity,
            efficiency = metrics.efficiency,
            adaptability = metrics.adaptability,
            coherence = metrics.coherence,
            confidence = confidence_score,
            "performance evaluated"
        );

        self.update_history(feedback.clone());
        self.adapt(&feedback);
        Ok(feedback)
    }

    fn calculate_metrics(&self, output: &Vector, expected: &Vector) -> Result<TrainingMetrics> {
        Ok(TrainingMetrics {
            accuracy: Similarity::cosine(output, expected)?,
            creativity: self.measure_creativity(output)?,
            efficiency: Self::calculate_efficiency(output),
            adaptability: self.calculate_adaptability(),
            coherence: self.measure_coherence(output),
        }
        .clamped())
    }

    /// Mean dissimilarity between `output` and its replay against each
    /// history entry. Zero without history.
    pub fn measure_creativity(&self, output: &Vector) -> Result<f64> {
        if self.history.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for entry in &self.history {
            let replayed = self
                .router
                .process(output, &ProcessContext::at(entry.timestamp))?;
            total += 1.0 - Similarity::cosine(output, &replayed)?;
        }
        Ok(total / self.history.len() as f64)
    }

    /// Share of zero elements.
    pub fn calculate_efficiency(output: &Vector) -> f64 {
        if output.is_empty() {
            return 0.0;
        }
        1.0 - output.nnz() as f64 / output.dimensions() as f64
    }

    /// `exp(-variance)` of historical confidence; 1 with fewer than two entries.
    pub fn calculate_adaptability(&self) -> f64 {
        if self.history.len() < 2 {
            return 1.0;
        }
        let n = self.history.len() as f64;
        let mean = self.history.iter().map(|h| h.confidence_score).sum::<f64>() / n;
        let variance = self
            .history
            .iter()
            .map(|h| (h.confidence_score - mean).powi(2))
            .sum::<f64>()
            / n;
        (-variance).exp()
    }

    /// Mean cosine similarity of consecutive fixed-size slices. Zero when the
    /// output holds fewer than two full slices.
    pub fn measure_coherence(&self, output: &Vector) -> f64 {
        let slices: Vec<&[f64]> = output.data().chunks_exact(self.coherence_slice).collect();
        if slices.len() < 2 {
            return 0.0;
        }
        let total: f64 = slices
            .windows(2)
            .map(|pair| Similarity::cosine_slices(pair[0], pair[1]))
            .sum();
        total / (slices.len() - 1) as f64
    }

    fn analyze_thought_patterns(
        &self,
        input: &Vector,
        output: &Vector,
    ) -> Result<BTreeMap<ThoughtType, f64>> {
        let mut improvements = BTreeMap::new();
        for thought_type in ThoughtType::ALL {
            let forced = self
                .router
                .process(input, &ProcessContext::forced(thought_type))?;
            let similarity = Similarity::cosine(output, &forced)?;
            let uniqueness = self.measure_creativity(&forced)?;
            improvements.insert(thought_type, (similarity + uniqueness) / 2.0);
        }
        Ok(improvements)
    }

    fn update_history(&mut self, feedback: TrainingFeedback) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(feedback);
    }

    /// Apply the adaptation rules for one feedback entry.
    pub fn adapt(&mut self, feedback: &TrainingFeedback) {
        if feedback.confidence_score < LOW_CONFIDENCE {
            self.learning_rate *= 1.0 + LEARNING_RATE_STEP;
            self.router.boost_creativity(CREATIVITY_BOOST);
        } else if feedback.confidence_score > HIGH_CONFIDENCE {
            self.learning_rate *= 1.0 - LEARNING_RATE_STEP;
            self.router.normalize_thinking();
        }

        for (&thought_type, &effectiveness) in &feedback.improvements {
            if effectiveness < EFFECTIVENESS_FLOOR - EFFECTIVENESS_TOLERANCE {
                self.router.boost_pattern(thought_type, PATTERN_BOOST);
            }
        }

        if self.telemetry_enabled {
            self.record_telemetry(feedback.timestamp);
        }
    }

    fn record_telemetry(&mut self, timestamp: i64) {
        let bound = self.capacity * ThoughtType::ALL.len();
        for pattern in self.router.patterns() {
            if self.telemetry.len() >= bound {
                self.telemetry.pop_front();
            }
            self.telemetry.push_back(PatternTelemetry {
                thought_type: pattern.thought_type,
                intensity: pattern.intensity,
                frequency: pattern.frequency,
                timestamp,
            });
        }
    }

    pub fn pending_telemetry(&self) -> usize {
        self.telemetry.len()
    }

    pub fn drain_telemetry(&mut self) -> Vec<PatternTelemetry> {
        self.telemetry.drain(..).collect()
    }

    pub fn performance_insights(&self) -> PerformanceInsights {
        let recent: Vec<&TrainingFeedback> = self
            .history
            .iter()
            .skip(self.history.len().saturating_sub(INSIGHT_WINDOW))
            .collect();

        if recent.is_empty() {
            return PerformanceInsights {
                average_confidence: None,
                learning_rate: self.learning_rate,
                sample_count: 0,
                pattern_effectiveness: BTreeMap::new(),
            };
        }

        let n = recent.len() as f64;
        let average = recent.iter().map(|f| f.confidence_score).sum::<f64>() / n;
        let mut totals: BTreeMap<ThoughtType, f64> = BTreeMap::new();
        for feedback in &recent {
            for (&thought_type, &value) in &feedback.improvements {
                *totals.entry(thought_type).or_insert(0.0) += value;
            }
        }
        for total in totals.values_mut() {
            *total /= n;
        }

        PerformanceInsights {
            average_confidence: Some(average),
            learning_rate: self.learning_rate,
            sample_count: self.history.len(),
            pattern_effectiveness: totals,
        }
    }
}
