//! Encoder: raw numeric input to unit hypervectors.
//!
//! Three operations, each run inside its own compute scope:
//!
//! - **create_pattern_vector**: normalize, then perturb with Gaussian noise
//! - **multi_dimensional_bind**: element-wise product of many vectors, renormalized
//! - **optimize_vector**: plain L2 normalization with a zero-magnitude guard

use crate::config::HolomemConfig;
use crate::error::{HolomemError, Result};
use crate::kernel::scope::ComputeScopeOptimizer;
use crate::kernel::vector::Vector;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;

/// Encoder for converting numeric input into pattern vectors.
#[derive(Debug)]
pub struct VectorEncoder {
    dimensions: usize,
    noise_level: f64,
    rng: Mutex<ChaCha8Rng>,
    optimizer: ComputeScopeOptimizer,
}

impl VectorEncoder {
    /// Create an encoder from configuration, sharing `optimizer`'s bookkeeping.
    pub fn new(config: &HolomemConfig, optimizer: ComputeScopeOptimizer) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            dimensions: config.dimensions,
            noise_level: config.noise_level,
            rng: Mutex::new(rng),
            optimizer,
        }
    }

    pub fn from_config(config: &HolomemConfig) -> Arc<Self> {
        Arc::new(Self::new(config, ComputeScopeOptimizer::from_config(config)))
    }

    /// Get the dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn noise_level(&self) -> f64 {
        self.noise_level
    }

    pub fn optimizer(&self) -> &ComputeScopeOptimizer {
        &self.optimizer
    }

    /// Normalize `input` and add noise drawn from N(0, noise_level).
    ///
    /// An all-zero input skips normalization and yields pure noise. Empty
    /// input is rejected.
    pub fn create_pattern_vector(&self, input: &[f64]) -> Result<Vector> {
        if input.is_empty() {
            return Err(HolomemError::EmptyInput(
                "pattern vector input has no elements".into(),
            ));
        }

        self.optimizer.optimize_computation(|scope| {
            let raw = Vector::from_data(input.to_vec());
            scope.track(&raw);
            let normalized = raw.normalized();
            self.add_noise(&normalized)
        })
    }

    fn add_noise(&self, v: &Vector) -> Result<Vector> {
        self.optimizer.optimize_computation(|scope| {
            let normal = Normal::new(0.0, self.noise_level).map_err(|e| {
                HolomemError::Configuration(format!("invalid noise level: {}", e))
            })?;
            let mut rng = self.rng.lock();
            let noisy: Vec<f64> = v
                .data()
                .iter()
                .map(|&x| x + normal.sample(&mut *rng))
                .collect();
            let noisy = Vector::from_data(noisy);
            scope.track(&noisy);
            Ok(noisy)
        })
    }

    /// Element-wise product of all `vectors`, divided by its own norm.
    ///
    /// An empty list yields the zero vector of the configured dimensionality.
    pub fn multi_dimensional_bind(&self, vectors: &[&Vector]) -> Result<Vector> {
        self.optimizer.optimize_computation(|scope| {
            let Some((first, rest)) = vectors.split_first() else {
                return Ok(Vector::zeros(self.dimensions));
            };

            let mut product = (*first).clone();
            for v in rest {
                if v.dimensions() != product.dimensions() {
                    return Err(HolomemError::DimensionMismatch {
                        expected: product.dimensions(),
                        got: v.dimensions(),
                    });
                }
                for (p, &x) in product.data_mut().iter_mut().zip(v.data()) {
                    *p *= x;
                }
            }
            scope.track(&product);
            Ok(product.normalized())
        })
    }

    /// Divide by magnitude. A zero-magnitude vector comes back unchanged.
    pub fn optimize_vector(&self, v: &Vector) -> Result<Vector> {
        self.optimizer
            .optimize_computation(|_| Ok(v.normalized()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(dimensions: usize, noise: f64) -> VectorEncoder {
        let config = HolomemConfig {
            dimensions,
            noise_level: noise,
            seed: Some(42),
            ..HolomemConfig::default()
        };
        VectorEncoder::new(&config, ComputeScopeOptimizer::from_config(&config))
    }

    #[test]
    fn test_pattern_vector_without_noise_is_unit() {
        let enc = encoder(4, 0.0);
        let v = enc.create_pattern_vector(&[3.0, 0.0, 4.0, 0.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[2] - 0.8).abs() < 1e-12);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pattern_vector_noise_is_seeded() {
        let a = encoder(64, 0.1).create_pattern_vector(&[1.0; 64]).unwrap();
        let b = encoder(64, 0.1).create_pattern_vector(&[1.0; 64]).unwrap();
        assert_eq!(a, b);
        assert!((a.norm() - 1.0).abs() > 1e-9);
    }

    #[test]
    fn test_pattern_vector_zero_input_is_pure_noise() {
        let enc = encoder(32, 0.1);
        let v = enc.create_pattern_vector(&[0.0; 32]).unwrap();
        assert_eq!(v.dimensions(), 32);
        assert!(v.nnz() > 0);
    }

    #[test]
    fn test_pattern_vector_empty_input_fails() {
        let enc = encoder(32, 0.1);
        assert!(matches!(
            enc.create_pattern_vector(&[]),
            Err(HolomemError::EmptyInput(_))
        ));
        assert_eq!(enc.optimizer().stats().open_scopes(), 0);
    }

    #[test]
    fn test_bind_empty_is_zero_vector() {
        let enc = encoder(128, 0.1);
        let v = enc.multi_dimensional_bind(&[]).unwrap();
        assert_eq!(v, Vector::zeros(128));
    }

    #[test]
    fn test_bind_single_is_normalize() {
        let enc = encoder(3, 0.1);
        let v = Vector::from_data(vec![2.0, -1.0, 2.0]);
        let bound = enc.multi_dimensional_bind(&[&v]).unwrap();
        assert_eq!(bound, v.normalized());
    }

    #[test]
    fn test_bind_is_elementwise_product() {
        let enc = encoder(3, 0.1);
        let a = Vector::from_data(vec![1.0, 2.0, 0.0]);
        let b = Vector::from_data(vec![3.0, 1.0, 5.0]);
        let bound = enc.multi_dimensional_bind(&[&a, &b]).unwrap();
        let expected = Vector::from_data(vec![3.0, 2.0, 0.0]).normalized();
        assert_eq!(bound, expected);
    }

    #[test]
    fn test_bind_dimension_mismatch() {
        let enc = encoder(3, 0.1);
        let a = Vector::zeros(3);
        let b = Vector::zeros(4);
        assert!(matches!(
            enc.multi_dimensional_bind(&[&a, &b]),
            Err(HolomemError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_optimize_vector() {
        let enc = encoder(3, 0.1);
        let zero = Vector::zeros(3);
        assert_eq!(enc.optimize_vector(&zero).unwrap(), zero);

        let v = Vector::from_data(vec![0.0, 5.0, 0.0]);
        assert_eq!(enc.optimize_vector(&v).unwrap().data(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_every_operation_releases_its_scope() {
        let enc = encoder(16, 0.1);
        enc.create_pattern_vector(&[1.0; 16]).unwrap();
        enc.multi_dimensional_bind(&[]).unwrap();
        enc.optimize_vector(&Vector::zeros(16)).unwrap();
        let stats = enc.optimizer().stats();
        // create_pattern_vector opens a nested scope for the noise step.
        assert_eq!(stats.opened, 4);
        assert_eq!(stats.open_scopes(), 0);
        assert_eq!(stats.live_bytes, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn optimize_vector_has_unit_norm(data in prop::collection::vec(-1e3f64..1e3, 1..64)) {
                let enc = encoder(data.len(), 0.1);
                let v = Vector::from_data(data);
                let out = enc.optimize_vector(&v).unwrap();
                if v.norm() == 0.0 {
                    prop_assert_eq!(out, v);
                } else {
                    prop_assert!((out.norm() - 1.0).abs() < 1e-9);
                }
            }
        }
    }
}
