//! Memory layer: similarity-indexed storage with state-aware consolidation.
//!
//! This module provides:
//!
//! - [`MemoryStore`]: the memory collection. Stores normalize vectors,
//!   recall ranks by cosine similarity, consolidation evicts under pressure.
//!
//! - [`Memory`] / [`MemoryDraft`] / [`MemoryRecord`]: the stored unit, the
//!   caller-side draft, and the persistence wire format.
//!
//! - [`ConsolidationStrategy`]: pluggable maintenance pass; the store uses
//!   [`RecencyWindow`] while constrained and [`IdentityConsolidation`]
//!   otherwise unless told differently.
//!
//! # Usage
//!
//! ```rust
//! use holomem::kernel::{Vector, VectorEncoder};
//! use holomem::memory::{MemoryDraft, MemoryStore, MemoryType};
//! use holomem::state::{StateView, SystemState};
//! use holomem::HolomemConfig;
//!
//! let config = HolomemConfig::with_dimensions(4);
//! let store = MemoryStore::new(
//!     &config,
//!     VectorEncoder::from_config(&config),
//!     StateView::fixed(SystemState::Full),
//! );
//!
//! let v = Vector::from_data(vec![1.0, 0.0, 0.0, 0.0]);
//! store.store(MemoryDraft::new(v.clone(), MemoryType::Semantic)).unwrap();
//!
//! let hits = store.recall(&v, Some(MemoryType::Semantic), Some(3)).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

pub mod consolidation;
pub mod record;
pub mod store;

pub use consolidation::{ConsolidationStrategy, IdentityConsolidation, RecencyWindow};
pub use record::{
    Memory, MemoryDimensions, MemoryDraft, MemoryId, MemoryMetadata, MemoryRecord, MemoryType,
};
pub use store::{MemoryStore, RecallRequest, Snapshot};
