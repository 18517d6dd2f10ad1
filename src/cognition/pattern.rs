//! Thought patterns and the processing context.

use crate::error::{HolomemError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtType {
    /// Narrow focus on one answer.
    Convergent,
    /// Exploratory, creative spread.
    Divergent,
    Critical,
    /// Big-picture reasoning.
    Abstract,
    /// Hands-on solutions.
    Concrete,
    Systems,
    /// Reasoning about the reasoning itself.
    Metacognitive,
}

impl ThoughtType {
    pub const ALL: [ThoughtType; 7] = [
        Self::Convergent,
        Self::Divergent,
        Self::Critical,
        Self::Abstract,
        Self::Concrete,
        Self::Systems,
        Self::Metacognitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Convergent => "convergent",
            Self::Divergent => "divergent",
            Self::Critical => "critical",
            Self::Abstract => "abstract",
            Self::Concrete => "concrete",
            Self::Systems => "systems",
            Self::Metacognitive => "metacognitive",
        }
    }

    /// The (intensity, frequency) a pattern starts with.
    pub fn default_weights(&self) -> (f64, f64) {
        match self {
            Self::Convergent => (0.9, 0.8),
            Self::Divergent => (1.2, 0.7),
            Self::Critical => (1.0, 0.9),
            Self::Abstract => (1.1, 0.6),
            Self::Concrete => (0.8, 1.0),
            Self::Systems => (1.0, 0.85),
            Self::Metacognitive => (0.7, 0.5),
        }
    }
}

impl fmt::Display for ThoughtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThoughtType {
    type Err = HolomemError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| HolomemError::InvalidContext(format!("unknown thought type '{}'", s)))
    }
}

/// Weight record for one thought type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThoughtPattern {
    #[serde(rename = "type")]
    pub thought_type: ThoughtType,
    pub intensity: f64,
    pub frequency: f64,
}

impl ThoughtPattern {
    pub fn default_for(thought_type: ThoughtType) -> Self {
        let (intensity, frequency) = thought_type.default_weights();
        Self {
            thought_type,
            intensity,
            frequency,
        }
    }

    /// Contribution of this pattern to a blended pass.
    pub fn weight(&self) -> f64 {
        self.intensity * self.frequency
    }
}

/// Options for a single router pass.
///
/// Closed set of fields; unknown keys in JSON are rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ProcessContext {
    /// Apply only this pattern instead of the blend.
    pub forced_pattern: Option<ThoughtType>,
    /// Timestamp (ms) of the history entry being replayed, if any.
    pub timestamp: Option<i64>,
}

impl ProcessContext {
    pub fn forced(thought_type: ThoughtType) -> Self {
        Self {
            forced_pattern: Some(thought_type),
            timestamp: None,
        }
    }

    pub fn at(timestamp: i64) -> Self {
        Self {
            forced_pattern: None,
            timestamp: Some(timestamp),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HolomemError::InvalidContext(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let p = ThoughtPattern::default_for(ThoughtType::Divergent);
        assert_eq!(p.intensity, 1.2);
        assert_eq!(p.frequency, 0.7);
        let p = ThoughtPattern::default_for(ThoughtType::Systems);
        assert_eq!((p.intensity, p.frequency), (1.0, 0.85));
        assert_eq!(ThoughtType::ALL.len(), 7);
    }

    #[test]
    fn test_context_from_json() {
        let ctx =
            ProcessContext::from_json_str(r#"{"forcedPattern": "critical", "timestamp": 5}"#)
                .unwrap();
        assert_eq!(ctx.forced_pattern, Some(ThoughtType::Critical));
        assert_eq!(ctx.timestamp, Some(5));

        assert_eq!(
            ProcessContext::from_json_str("{}").unwrap(),
            ProcessContext::default()
        );
    }

    #[test]
    fn test_context_rejects_unknown_fields() {
        let err = ProcessContext::from_json_str(r#"{"mood": "sunny"}"#).unwrap_err();
        assert!(matches!(err, HolomemError::InvalidContext(_)));
    }

    #[test]
    fn test_thought_type_parse() {
        assert_eq!(
            "metacognitive".parse::<ThoughtType>().unwrap(),
            ThoughtType::Metacognitive
        );
        assert!("lateral".parse::<ThoughtType>().is_err());
    }
}
