//! Kernel layer: foundational vector operations.
//!
//! The kernel provides the minimal, stable foundation for all holomem operations:
//! - Dense hypervectors ([`Vector`])
//! - Cosine and dot similarity ([`Similarity`])
//! - Scoped computation with guaranteed release ([`ComputeScopeOptimizer`])
//! - Normalize / noise / bind encoding ([`VectorEncoder`])
//! - Deterministic prompt data ([`PromptDeriver`])
//!
//! This layer has no dependencies on [`memory`](crate::memory),
//! [`cognition`](crate::cognition) or [`highlevel`](crate::highlevel).
//!
//! # Example
//!
//! ```rust
//! use holomem::kernel::{Similarity, Vector, VectorEncoder};
//! use holomem::HolomemConfig;
//!
//! let config = HolomemConfig { dimensions: 4, noise_level: 0.0, ..Default::default() };
//! let enc = VectorEncoder::from_config(&config);
//!
//! let a = enc.create_pattern_vector(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = enc.multi_dimensional_bind(&[&a, &a]).unwrap();
//! let sim = Similarity::cosine(&a, &b).unwrap();
//! assert!(sim > 0.5);
//! ```

pub mod encoder;
pub mod prompt;
pub mod scope;
pub mod similarity;
pub mod vector;

pub use encoder::VectorEncoder;
pub use prompt::PromptDeriver;
pub use scope::{CompressionPolicy, ComputeScopeOptimizer, ScopeGuard, ScopeStats};
pub use similarity::Similarity;
pub use vector::Vector;
