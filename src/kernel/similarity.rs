//! Similarity metrics for vector comparison.

use crate::error::{HolomemError, Result};
use crate::kernel::vector::Vector;

/// Similarity computation for vectors.
pub struct Similarity;

impl Similarity {
    /// Cosine similarity: dot(a, b) / (||a|| * ||b||)
    ///
    /// Returns a value in [-1, 1] where:
    /// - 1 means identical (parallel)
    /// - 0 means orthogonal (unrelated)
    /// - -1 means opposite (anti-parallel)
    ///
    /// A zero-magnitude operand has no direction; the similarity is 0.
    pub fn cosine(a: &Vector, b: &Vector) -> Result<f64> {
        let dot = Self::dot(a, b)?;
        let norm_a = a.norm();
        let norm_b = b.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        Ok(dot / (norm_a * norm_b))
    }

    /// Raw dot product.
    pub fn dot(a: &Vector, b: &Vector) -> Result<f64> {
        Self::check_dimensions(a, b)?;
        Ok(Self::dot_slices(a.data(), b.data()))
    }

    /// Cosine similarity over raw slices of equal length.
    pub(crate) fn cosine_slices(a: &[f64], b: &[f64]) -> f64 {
        let dot = Self::dot_slices(a, b);
        let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }

    fn dot_slices(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    fn check_dimensions(a: &Vector, b: &Vector) -> Result<()> {
        if a.dimensions() != b.dimensions() {
            return Err(HolomemError::DimensionMismatch {
                expected: a.dimensions(),
                got: b.dimensions(),
            });
        }
        Ok(())
    }
}
