//! In-process persistence backend.

use super::{ListFilter, MemoryPersistence};
use crate::cognition::PatternTelemetry;
use crate::error::{HolomemError, Result};
use crate::memory::MemoryRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Keeps records in insertion order. Can be switched into a failing mode to
/// exercise the sync error path.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    records: RwLock<Vec<(String, MemoryRecord)>>,
    patterns: RwLock<Vec<PatternTelemetry>>,
    failing: AtomicBool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every call fails with a persistence error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn patterns(&self) -> Vec<PatternTelemetry> {
        self.patterns.read().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HolomemError::Persistence("backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryPersistence for InMemoryPersistence {
    async fn insert(&self, record: MemoryRecord) -> Result<String> {
        self.check()?;
        let id = Uuid::new_v4().to_string();
        self.records.write().push((id.clone(), record));
        Ok(id)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<MemoryRecord>> {
        self.check()?;
        let records = self.records.read();
        Ok(records
            .iter()
            .map(|(_, r)| r)
            .filter(|r| filter.memory_type.map_or(true, |t| r.memory_type == t))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn record_pattern(&self, telemetry: PatternTelemetry) -> Result<()> {
        self.check()?;
        self.patterns.write().push(telemetry);
        Ok(())
    }
}
