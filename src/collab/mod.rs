//! External collaborators consumed by the core.
//!
//! Every collaborator is an explicit handle passed into the controller at
//! construction. Nothing here is a process-wide singleton.
//!
//! - [`ResourceProbe`] reports CPU/memory/bandwidth availability for
//!   diagnostics.
//! - [`EmbeddingProvider`] turns text into a numeric vector (the personality
//!   prompt source).
//! - [`MemoryPersistence`] receives synced memories and pattern telemetry.

pub mod http;
pub mod in_memory;

pub use http::HttpEmbeddingProvider;
pub use in_memory::InMemoryPersistence;

use crate::cognition::PatternTelemetry;
use crate::error::Result;
use crate::kernel::PromptDeriver;
use crate::memory::{MemoryRecord, MemoryType};
use crate::state::SystemResources;
use async_trait::async_trait;
use parking_lot::RwLock;

/// Source of resource availability readings.
pub trait ResourceProbe: Send + Sync {
    fn sample(&self) -> Result<SystemResources>;
}

/// Probe returning whatever reading it was last given.
#[derive(Debug, Default)]
pub struct ManualProbe {
    reading: RwLock<SystemResources>,
}

impl ManualProbe {
    pub fn new(reading: SystemResources) -> Self {
        Self {
            reading: RwLock::new(reading),
        }
    }

    pub fn set(&self, reading: SystemResources) {
        *self.reading.write() = reading;
    }
}

impl ResourceProbe for ManualProbe {
    fn sample(&self) -> Result<SystemResources> {
        Ok(*self.reading.read())
    }
}

/// Text to vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Local, deterministic embedding used when no remote provider is configured.
#[async_trait]
impl EmbeddingProvider for PromptDeriver {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        Ok(self.derive(text).as_ref().clone())
    }
}

/// Filter for [`MemoryPersistence::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub memory_type: Option<MemoryType>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn of_type(memory_type: MemoryType) -> Self {
        Self {
            memory_type: Some(memory_type),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Durable storage for memories and thought-pattern telemetry.
#[async_trait]
pub trait MemoryPersistence: Send + Sync {
    /// Persist one record and return the identifier the backend assigned.
    async fn insert(&self, record: MemoryRecord) -> Result<String>;

    /// Records in insertion order, filtered.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<MemoryRecord>>;

    async fn record_pattern(&self, telemetry: PatternTelemetry) -> Result<()>;
}
