//! MemoryStore: similarity-indexed memory collection.
//!
//! Mutations (`store`, `consolidate`) go through a single writer lane and
//! publish a fresh immutable snapshot when they finish. `recall` clones the
//! current snapshot pointer and scores against it, so readers never block
//! each other and never observe a half-consolidated collection.

use super::consolidation::{ConsolidationStrategy, IdentityConsolidation, RecencyWindow};
use super::record::{Memory, MemoryDraft, MemoryId, MemoryType};
use crate::cognition::ThoughtType;
use crate::config::HolomemConfig;
use crate::error::{HolomemError, Result};
use crate::kernel::{Similarity, Vector, VectorEncoder};
use crate::state::{StateView, SystemState};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type Snapshot = Arc<Vec<Arc<Memory>>>;

/// Parameters of a recall.
#[derive(Clone, Debug)]
pub struct RecallRequest<'a> {
    pub query: &'a Vector,
    pub memory_type: Option<MemoryType>,
    /// Accepted for callers that track the active thought type. It does not
    /// influence filtering or ranking.
    pub thought_type: Option<ThoughtType>,
    /// Falls back to the configured default when `None`.
    pub top_k: Option<usize>,
}

impl<'a> RecallRequest<'a> {
    pub fn new(query: &'a Vector) -> Self {
        Self {
            query,
            memory_type: None,
            thought_type: None,
            top_k: None,
        }
    }

    pub fn memory_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = Some(memory_type);
        self
    }

    pub fn thought_type(mut self, thought_type: ThoughtType) -> Self {
        self.thought_type = Some(thought_type);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

pub struct MemoryStore {
    encoder: Arc<VectorEncoder>,
    state: StateView,
    recency: RecencyWindow,
    full_strategy: Box<dyn ConsolidationStrategy>,
    constrained_top_k: usize,
    default_top_k: usize,
    snapshot: RwLock<Snapshot>,
    writer: Mutex<()>,
    sync_tracking: bool,
    /// Bound on `pending_sync`; the oldest entries are dropped beyond it.
    pending_capacity: usize,
    pending_sync: Mutex<Vec<Arc<Memory>>>,
}

impl MemoryStore {
    pub fn new(config: &HolomemConfig, encoder: Arc<VectorEncoder>, state: StateView) -> Self {
        Self {
            encoder,
            state,
            recency: RecencyWindow::new(config.recency_window),
            full_strategy: Box::new(IdentityConsolidation),
            constrained_top_k: config.constrained_top_k,
            default_top_k: config.default_top_k,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(()),
            sync_tracking: false,
            pending_capacity: config.recency_window,
            pending_sync: Mutex::new(Vec::new()),
        }
    }

    /// Queue every stored memory for a later push to persistence.
    pub fn with_sync_tracking(mut self, enabled: bool) -> Self {
        self.sync_tracking = enabled;
        self
    }

    /// Replace the strategy used outside constrained mode.
    pub fn with_full_strategy(mut self, strategy: Box<dyn ConsolidationStrategy>) -> Self {
        self.full_strategy = strategy;
        self
    }

    pub fn system_state(&self) -> SystemState {
        self.state.get()
    }

    /// Normalize, append and (unless offline) consolidate.
    ///
    /// Returns once the consolidated collection is visible to readers.
    /// Vectors must have the encoder's dimensionality.
    pub fn store(&self, draft: MemoryDraft) -> Result<MemoryId> {
        if draft.vector.dimensions() != self.encoder.dimensions() {
            return Err(HolomemError::DimensionMismatch {
                expected: self.encoder.dimensions(),
                got: draft.vector.dimensions(),
            });
        }
        let _lane = self.writer.lock();

        let normalized = self.encoder.optimize_vector(&draft.vector)?;
        let memory = Arc::new(Memory::from_draft(draft, normalized));
        let id = memory.id();

        let mut next = (*self.snapshot()).clone();
        next.push(Arc::clone(&memory));

        let state = self.state.get();
        let mut evicted = 0;
        if state == SystemState::Offline {
            debug!(%id, "stored memory locally without consolidation");
        } else {
            evicted = self.consolidate_list(&mut next, state);
        }
        if self.sync_tracking {
            let mut pending = self.pending_sync.lock();
            pending.push(memory);
            if evicted > 0 {
                Self::retain_live(&mut pending, &next);
            }
            self.enforce_pending_capacity(&mut pending);
        }
        let len = next.len();
        *self.snapshot.write() = Arc::new(next);

        debug!(%id, len, %state, "memory stored");
        Ok(id)
    }

    /// Run one consolidation pass under the writer lane.
    pub fn consolidate(&self) {
        let _lane = self.writer.lock();
        let mut next = (*self.snapshot()).clone();
        let evicted = self.consolidate_list(&mut next, self.state.get());
        if evicted > 0 {
            Self::retain_live(&mut self.pending_sync.lock(), &next);
        }
        *self.snapshot.write() = Arc::new(next);
    }

    /// Drop queued memories that consolidation removed from `live`.
    fn retain_live(pending: &mut Vec<Arc<Memory>>, live: &[Arc<Memory>]) {
        let ids: HashSet<MemoryId> = live.iter().map(|m| m.id()).collect();
        pending.retain(|m| ids.contains(&m.id()));
    }

    fn enforce_pending_capacity(&self, pending: &mut Vec<Arc<Memory>>) {
        if pending.len() > self.pending_capacity {
            let dropped = pending.len() - self.pending_capacity;
            pending.drain(..dropped);
            warn!(dropped, capacity = self.pending_capacity, "sync queue full, dropped oldest");
        }
    }

    /// Returns the number of evicted memories.
    fn consolidate_list(&self, memories: &mut Vec<Arc<Memory>>, state: SystemState) -> usize {
        let before = memories.len();
        let strategy: &dyn ConsolidationStrategy = if state == SystemState::Constrained {
            &self.recency
        } else {
            self.full_strategy.as_ref()
        };
        strategy.consolidate(memories);

        let evicted = before - memories.len();
        if evicted > 0 {
            info!(
                strategy = strategy.name(),
                evicted,
                remaining = memories.len(),
                "consolidation evicted memories"
            );
        }
        evicted
    }

    /// Top `top_k` memories by cosine similarity to `query`.
    pub fn recall(
        &self,
        query: &Vector,
        memory_type: Option<MemoryType>,
        top_k: Option<usize>,
    ) -> Result<Vec<Arc<Memory>>> {
        self.recall_request(&RecallRequest {
            query,
            memory_type,
            thought_type: None,
            top_k,
        })
    }

    /// Results are ordered by non-increasing similarity; ties keep insertion
    /// order. While constrained at most `constrained_top_k` come back.
    pub fn recall_request(&self, request: &RecallRequest<'_>) -> Result<Vec<Arc<Memory>>> {
        let mut top_k = request.top_k.unwrap_or(self.default_top_k);
        if self.state.get() == SystemState::Constrained {
            top_k = top_k.min(self.constrained_top_k);
        }

        let snapshot = self.snapshot();
        let mut scored = Vec::with_capacity(snapshot.len());
        for memory in snapshot
            .iter()
            .filter(|m| request.memory_type.map_or(true, |t| m.memory_type() == t))
        {
            let similarity = Similarity::cosine(request.query, memory.vector())?;
            scored.push((Arc::clone(memory), similarity));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored.into_iter().map(|(memory, _)| memory).collect())
    }

    /// The most recently published collection, oldest first.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    pub fn get(&self, id: MemoryId) -> Option<Arc<Memory>> {
        self.snapshot().iter().find(|m| m.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_sync_count(&self) -> usize {
        self.pending_sync.lock().len()
    }

    /// Take every memory stored since the last successful sync.
    pub(crate) fn drain_pending_sync(&self) -> Vec<Arc<Memory>> {
        std::mem::take(&mut *self.pending_sync.lock())
    }

    /// Put unsynced memories back ahead of anything stored meanwhile.
    pub(crate) fn requeue_pending_sync(&self, mut memories: Vec<Arc<Memory>>) {
        let mut pending = self.pending_sync.lock();
        memories.append(&mut pending);
        *pending = memories;
        self.enforce_pending_capacity(&mut pending);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field("state", &self.state.get())
            .field("full_strategy", &self.full_strategy.name())
            .finish()
    }
}
