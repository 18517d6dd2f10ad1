//! Memory records: the stored unit of the associative memory.
//!
//! A [`MemoryDraft`] is what callers hand to the store; the store assigns an
//! id, normalizes the vector and freezes the result into a [`Memory`].
//! [`MemoryRecord`] is the wire shape exchanged with persistence backends.

use crate::error::HolomemError;
use crate::kernel::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type MemoryId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
    Pattern,
    Quantum,
}

impl MemoryType {
    pub const ALL: [MemoryType; 5] = [
        Self::Episodic,
        Self::Semantic,
        Self::Procedural,
        Self::Pattern,
        Self::Quantum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
            Self::Pattern => "pattern",
            Self::Quantum => "quantum",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = HolomemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| HolomemError::Persistence(format!("unknown memory type '{}'", s)))
    }
}

/// Optional positional data used by map/3D consumers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<[f64; 3]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetadata {
    pub context: String,
    /// Clamped to [0, 1] by the constructors.
    pub confidence: f64,
    pub associations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<MemoryDimensions>,
}

impl MemoryMetadata {
    pub fn new(context: impl Into<String>, confidence: f64) -> Self {
        Self {
            context: context.into(),
            confidence: confidence.clamp(0.0, 1.0),
            associations: Vec::new(),
            dimensions: None,
        }
    }

    pub fn with_associations<I, S>(mut self, associations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.associations = associations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spatial(mut self, spatial: [f64; 3]) -> Self {
        self.dimensions = Some(MemoryDimensions {
            spatial: Some(spatial),
        });
        self
    }

    pub fn spatial(&self) -> Option<[f64; 3]> {
        self.dimensions.as_ref().and_then(|d| d.spatial)
    }
}

/// A memory before it has been stored.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryDraft {
    pub vector: Vector,
    pub memory_type: MemoryType,
    pub layer: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub metadata: MemoryMetadata,
}

impl MemoryDraft {
    /// Draft stamped with the current time, layer 0 and empty metadata.
    pub fn new(vector: Vector, memory_type: MemoryType) -> Self {
        Self {
            vector,
            memory_type,
            layer: 0,
            timestamp: chrono::Utc::now().timestamp_millis(),
            metadata: MemoryMetadata::default(),
        }
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, metadata: MemoryMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A stored memory. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Memory {
    id: MemoryId,
    vector: Vector,
    memory_type: MemoryType,
    layer: u32,
    timestamp: i64,
    metadata: MemoryMetadata,
}

impl Memory {
    pub(crate) fn from_draft(draft: MemoryDraft, normalized: Vector) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector: normalized,
            memory_type: draft.memory_type,
            layer: draft.layer,
            timestamp: draft.timestamp,
            metadata: draft.metadata,
        }
    }

    pub fn id(&self) -> MemoryId {
        self.id
    }

    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn metadata(&self) -> &MemoryMetadata {
        &self.metadata
    }
}

/// Persistence wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub vector: Vec<f64>,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub layer: u32,
    pub timestamp: i64,
    pub metadata: MemoryMetadata,
}

impl From<&Memory> for MemoryRecord {
    fn from(memory: &Memory) -> Self {
        Self {
            vector: memory.vector.data().to_vec(),
            memory_type: memory.memory_type,
            layer: memory.layer,
            timestamp: memory.timestamp,
            metadata: memory.metadata.clone(),
        }
    }
}

impl From<MemoryRecord> for MemoryDraft {
    fn from(record: MemoryRecord) -> Self {
        Self {
            vector: Vector::from_data(record.vector),
            memory_type: record.memory_type,
            layer: record.layer,
            timestamp: record.timestamp,
            metadata: record.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_type_parse() {
        assert_eq!("semantic".parse::<MemoryType>().unwrap(), MemoryType::Semantic);
        assert!("dream".parse::<MemoryType>().is_err());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(MemoryMetadata::new("x", 1.7).confidence, 1.0);
        assert_eq!(MemoryMetadata::new("x", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_record_wire_shape() {
        let draft = MemoryDraft::new(Vector::from_data(vec![1.0, 0.0]), MemoryType::Episodic)
            .with_layer(2)
            .with_timestamp(1_700_000_000_000)
            .with_metadata(
                MemoryMetadata::new("workshop", 0.9)
                    .with_associations(["tools", "lab"])
                    .with_spatial([1.0, 2.0, 3.0]),
            );
        let memory = Memory::from_draft(draft.clone(), draft.vector.clone());
        let record = MemoryRecord::from(&memory);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "episodic");
        assert_eq!(json["layer"], 2);
        assert_eq!(json["metadata"]["context"], "workshop");
        assert_eq!(json["metadata"]["associations"][1], "lab");
        assert_eq!(json["metadata"]["dimensions"]["spatial"][2], 3.0);
    }

    #[test]
    fn test_record_without_dimensions_omits_key() {
        let record = MemoryRecord {
            vector: vec![0.5],
            memory_type: MemoryType::Quantum,
            layer: 0,
            timestamp: 0,
            metadata: MemoryMetadata::new("plain", 0.5),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["metadata"].get("dimensions").is_none());

        let back: MemoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_ids_are_unique() {
        let draft = MemoryDraft::new(Vector::zeros(2), MemoryType::Pattern);
        let a = Memory::from_draft(draft.clone(), Vector::zeros(2));
        let b = Memory::from_draft(draft, Vector::zeros(2));
        assert_ne!(a.id(), b.id());
    }
}
