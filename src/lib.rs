//! # holomem: adaptive hyperdimensional memory and cognition
//!
//! holomem encodes inputs as high-dimensional vectors, keeps a
//! similarity-indexed memory of them, routes inputs through a weighted set of
//! thought patterns, and tunes those weights from self-evaluation. A small
//! state machine degrades the whole thing gracefully when resources are
//! scarce, the network is gone or initialisation fails.
//!
//! ## Quick Start
//!
//! ```rust
//! use holomem::{Collaborators, HolomemConfig, ProcessContext, ResourceStateController};
//! use holomem::{SystemState, Vector};
//!
//! # tokio_test_runtime(async {
//! let config = HolomemConfig { dimensions: 256, seed: Some(1), ..Default::default() };
//! let controller = ResourceStateController::initialize(config, Collaborators::default())
//!     .await
//!     .unwrap();
//! assert_eq!(controller.get_system_state(), SystemState::Full);
//!
//! let input = Vector::from_data(vec![0.5; 256]);
//! let output = controller.process(&input, &ProcessContext::default()).unwrap();
//! assert_eq!(output.dimensions(), 256);
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Layers
//!
//! | Module | Contents |
//! |---|---|
//! | [`kernel`] | vectors, similarity, compute scopes, the encoder |
//! | [`memory`] | the memory store and its consolidation strategies |
//! | [`cognition`] | thought patterns, the router, the feedback trainer |
//! | [`collab`] | probe, embedding and persistence collaborators |
//! | [`highlevel`] | the resource state controller |
//!
//! [`state`] holds the shared [`SystemState`]; [`config`] and [`error`] are
//! used everywhere.

pub mod cognition;
pub mod collab;
pub mod config;
pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod memory;
pub mod state;

pub use cognition::{
    CognitiveRouter, FeedbackTrainer, PerformanceInsights, ProcessContext, ThoughtPattern,
    ThoughtType, TrainingFeedback, TrainingMetrics,
};
pub use config::HolomemConfig;
pub use error::{HolomemError, Result};
pub use highlevel::{Collaborators, ResourceStateController};
pub use kernel::{ComputeScopeOptimizer, Similarity, Vector, VectorEncoder};
pub use memory::{Memory, MemoryDraft, MemoryId, MemoryStore, MemoryType};
pub use state::{FeatureSet, SystemResources, SystemState};
