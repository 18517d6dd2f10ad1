//! Consolidation strategies for the memory collection.
//!
//! The store always applies [`RecencyWindow`] while the system is constrained.
//! Any other state runs the pluggable "full" strategy, which defaults to
//! [`IdentityConsolidation`].

use super::record::Memory;
use std::fmt;
use std::sync::Arc;

/// Maintenance pass over the memory collection, oldest first.
///
/// Strategies may only remove entries; they must keep the relative
/// insertion order of what remains.
pub trait ConsolidationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn consolidate(&self, memories: &mut Vec<Arc<Memory>>);
}

/// Leaves the collection untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityConsolidation;

impl ConsolidationStrategy for IdentityConsolidation {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn consolidate(&self, _memories: &mut Vec<Arc<Memory>>) {}
}

/// Keeps only the `capacity` most recently inserted memories.
#[derive(Clone, Copy, Debug)]
pub struct RecencyWindow {
    capacity: usize,
}

impl RecencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ConsolidationStrategy for RecencyWindow {
    fn name(&self) -> &'static str {
        "recency_window"
    }

    fn consolidate(&self, memories: &mut Vec<Arc<Memory>>) {
        if memories.len() > self.capacity {
            let excess = memories.len() - self.capacity;
            memories.drain(..excess);
        }
    }
}
