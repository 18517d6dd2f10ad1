//! Scoped compute regions with guaranteed release.
//!
//! Every vector computation runs inside a region opened by
//! [`ComputeScopeOptimizer`]. The region is represented by a [`ScopeGuard`];
//! intermediates registered with the guard are released when it drops, which
//! happens on success, on `?` early return, and during unwinding.
//!
//! Compression only applies to the outermost region on a thread and never
//! changes a vector's length: the down-sampled payload is expanded back to
//! the original dimensionality before it is returned.
//!
//! ```rust
//! use holomem::kernel::{ComputeScopeOptimizer, CompressionPolicy, Vector};
//!
//! let optimizer = ComputeScopeOptimizer::new(CompressionPolicy::default());
//! let out = optimizer
//!     .optimize_computation(|scope| {
//!         let v = Vector::from_data(vec![1.0, 2.0]);
//!         scope.track(&v);
//!         Ok(v)
//!     })
//!     .unwrap();
//! assert_eq!(out.dimensions(), 2);
//! assert_eq!(optimizer.stats().open_scopes(), 0);
//! ```

use crate::config::HolomemConfig;
use crate::error::Result;
use crate::kernel::vector::Vector;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

thread_local! {
    /// Compute regions currently open on this thread.
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Number of quantization levels spanning [-1, 1].
const QUANTIZATION_LEVELS: f64 = 255.0;

/// Size-based compression applied to every scoped result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionPolicy {
    /// Results whose payload exceeds this many bytes are compressed.
    pub memory_limit_bytes: usize,
    /// Fraction of elements kept by down-sampling.
    pub ratio: f64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 512 * 1024,
            ratio: 0.75,
        }
    }
}

impl CompressionPolicy {
    pub fn from_config(config: &HolomemConfig) -> Self {
        Self {
            memory_limit_bytes: config.memory_limit_bytes(),
            ratio: config.compression_ratio,
        }
    }

    pub fn should_compress(&self, v: &Vector) -> bool {
        v.size_bytes() > self.memory_limit_bytes
    }

    /// Quantize, down-sample, then expand back to the input length.
    pub fn compress(&self, v: &Vector) -> Vector {
        let reduced = Self::downsample(&Self::quantize(v), self.ratio);
        Self::expand(&reduced, v.dimensions())
    }

    /// Snap every element onto one of 256 evenly spaced levels in [-1, 1].
    pub fn quantize(v: &Vector) -> Vector {
        let data = v
            .data()
            .iter()
            .map(|&x| {
                let clamped = x.clamp(-1.0, 1.0);
                let level = ((clamped + 1.0) / 2.0 * QUANTIZATION_LEVELS).round();
                level / QUANTIZATION_LEVELS * 2.0 - 1.0
            })
            .collect();
        Vector::from_data(data)
    }

    /// Area-average resampling to `ceil(len * ratio)` elements.
    pub fn downsample(v: &Vector, ratio: f64) -> Vector {
        let n = v.dimensions();
        if n == 0 {
            return v.clone();
        }
        let n_out = ((n as f64 * ratio).ceil() as usize).clamp(1, n);
        if n_out == n {
            return v.clone();
        }

        let data = v.data();
        let step = n as f64 / n_out as f64;
        let mut out = Vec::with_capacity(n_out);
        for i in 0..n_out {
            let start = i as f64 * step;
            let end = start + step;
            let mut acc = 0.0;
            let mut j = start.floor() as usize;
            while j < n && (j as f64) < end {
                let lo = start.max(j as f64);
                let hi = end.min(j as f64 + 1.0);
                acc += data[j] * (hi - lo);
                j += 1;
            }
            out.push(acc / step);
        }
        Vector::from_data(out)
    }

    /// Sample-and-hold resampling up to `len` elements.
    pub fn expand(v: &Vector, len: usize) -> Vector {
        let n = v.dimensions();
        if n == 0 || n == len {
            return v.clone();
        }
        let data = v.data();
        let out = (0..len).map(|i| data[(i * n / len).min(n - 1)]).collect();
        Vector::from_data(out)
    }
}

#[derive(Debug, Default)]
struct ScopeCounters {
    opened: AtomicU64,
    closed: AtomicU64,
    live_bytes: AtomicUsize,
    compressions: AtomicU64,
}

/// Point-in-time view of scope bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeStats {
    pub opened: u64,
    pub closed: u64,
    /// Bytes registered by scopes that have not closed yet.
    pub live_bytes: usize,
    pub compressions: u64,
}

impl ScopeStats {
    pub fn open_scopes(&self) -> u64 {
        self.opened - self.closed
    }
}

/// Opens compute regions and compresses their results.
///
/// Cloning shares the bookkeeping, so nested components report into the
/// same counters.
#[derive(Clone, Debug)]
pub struct ComputeScopeOptimizer {
    policy: CompressionPolicy,
    counters: Arc<ScopeCounters>,
}

impl ComputeScopeOptimizer {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self {
            policy,
            counters: Arc::new(ScopeCounters::default()),
        }
    }

    pub fn from_config(config: &HolomemConfig) -> Self {
        Self::new(CompressionPolicy::from_config(config))
    }

    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    /// Open a region. It closes when the returned guard drops.
    pub fn open(&self) -> ScopeGuard {
        let id = self.counters.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let depth = SCOPE_DEPTH.with(|d| {
            d.set(d.get() + 1);
            d.get()
        });
        trace!(scope = id, depth, "compute scope opened");
        ScopeGuard {
            id,
            depth,
            tracked_bytes: 0,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Run `f` inside a fresh region, then apply the compression policy to
    /// its result before the region closes. Nested regions pass results
    /// through untouched.
    pub fn optimize_computation<F>(&self, f: F) -> Result<Vector>
    where
        F: FnOnce(&mut ScopeGuard) -> Result<Vector>,
    {
        let mut scope = self.open();
        let result = f(&mut scope)?;
        Ok(self.optimize_memory_usage(result, &scope))
    }

    fn optimize_memory_usage(&self, v: Vector, scope: &ScopeGuard) -> Vector {
        if scope.depth > 1 || !self.policy.should_compress(&v) {
            return v;
        }
        let compressed = self.policy.compress(&v);
        self.counters.compressions.fetch_add(1, Ordering::Relaxed);
        trace!(
            scope = scope.id,
            dimensions = v.dimensions(),
            ratio = self.policy.ratio,
            "compressed scoped result"
        );
        compressed
    }

    pub fn stats(&self) -> ScopeStats {
        ScopeStats {
            opened: self.counters.opened.load(Ordering::SeqCst),
            closed: self.counters.closed.load(Ordering::SeqCst),
            live_bytes: self.counters.live_bytes.load(Ordering::SeqCst),
            compressions: self.counters.compressions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ComputeScopeOptimizer {
    fn default() -> Self {
        Self::new(CompressionPolicy::default())
    }
}

/// An open compute region.
#[derive(Debug)]
pub struct ScopeGuard {
    id: u64,
    depth: usize,
    tracked_bytes: usize,
    counters: Arc<ScopeCounters>,
}

impl ScopeGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 1 for an outermost region.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Register an intermediate allocation owned by this region.
    pub fn track(&mut self, v: &Vector) {
        let bytes = v.size_bytes();
        self.tracked_bytes += bytes;
        self.counters.live_bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn tracked_bytes(&self) -> usize {
        self.tracked_bytes
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPE_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        self.counters
            .live_bytes
            .fetch_sub(self.tracked_bytes, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        trace!(
            scope = self.id,
            released_bytes = self.tracked_bytes,
            "compute scope closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HolomemError;

    #[test]
    fn test_scope_closes_on_success() {
        let opt = ComputeScopeOptimizer::default();
        let out = opt
            .optimize_computation(|scope| {
                let v = Vector::from_data(vec![1.0; 16]);
                scope.track(&v);
                assert_eq!(scope.tracked_bytes(), 128);
                Ok(v)
            })
            .unwrap();
        assert_eq!(out.dimensions(), 16);

        let stats = opt.stats();
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.open_scopes(), 0);
        assert_eq!(stats.live_bytes, 0);
    }

    #[test]
    fn test_scope_closes_on_error() {
        let opt = ComputeScopeOptimizer::default();
        let result = opt.optimize_computation(|scope| {
            scope.track(&Vector::zeros(64));
            Err(HolomemError::EmptyInput("boom".into()))
        });
        assert!(result.is_err());

        let stats = opt.stats();
        assert_eq!(stats.open_scopes(), 0);
        assert_eq!(stats.live_bytes, 0);
    }

    #[test]
    fn test_scope_closes_on_panic() {
        let opt = ComputeScopeOptimizer::default();
        let cloned = opt.clone();
        let outcome = std::panic::catch_unwind(move || {
            let _ = cloned.optimize_computation(|scope| {
                scope.track(&Vector::zeros(8));
                panic!("computation failed");
            });
        });
        assert!(outcome.is_err());
        assert_eq!(opt.stats().open_scopes(), 0);
        assert_eq!(opt.stats().live_bytes, 0);
    }

    #[test]
    fn test_nested_scopes() {
        let opt = ComputeScopeOptimizer::default();
        let inner_opt = opt.clone();
        opt.optimize_computation(|outer| {
            assert_eq!(outer.depth(), 1);
            inner_opt.optimize_computation(|inner| {
                assert_eq!(inner.depth(), 2);
                Ok(Vector::zeros(4))
            })?;
            assert_eq!(inner_opt.stats().open_scopes(), 1);
            Ok(Vector::zeros(4))
        })
        .unwrap();
        assert_eq!(opt.stats().opened, 2);
        assert_eq!(opt.stats().open_scopes(), 0);
    }

    #[test]
    fn test_small_results_are_not_compressed() {
        let opt = ComputeScopeOptimizer::default();
        let out = opt
            .optimize_computation(|_| Ok(Vector::from_data(vec![0.3; 10_000])))
            .unwrap();
        assert_eq!(out.dimensions(), 10_000);
        assert_eq!(opt.stats().compressions, 0);
    }

    #[test]
    fn test_large_results_are_compressed() {
        let opt = ComputeScopeOptimizer::new(CompressionPolicy {
            memory_limit_bytes: 64,
            ratio: 0.75,
        });
        let out = opt
            .optimize_computation(|_| Ok(Vector::from_data(vec![0.5; 100])))
            .unwrap();
        assert_eq!(out.dimensions(), 100);
        assert_eq!(opt.stats().compressions, 1);
        // Constant input survives quantize + average up to quantization error.
        assert!(out.data().iter().all(|&x| (x - 0.5).abs() < 1.0 / 255.0));
    }

    #[test]
    fn test_nested_results_are_compressed_once() {
        let opt = ComputeScopeOptimizer::new(CompressionPolicy {
            memory_limit_bytes: 64,
            ratio: 0.75,
        });
        let inner_opt = opt.clone();
        let out = opt
            .optimize_computation(|_| {
                let inner = inner_opt
                    .optimize_computation(|_| Ok(Vector::from_data(vec![0.25; 256])))?;
                assert_eq!(inner.dimensions(), 256);
                Ok(inner)
            })
            .unwrap();
        assert_eq!(out.dimensions(), 256);
        assert_eq!(opt.stats().compressions, 1);
    }

    #[test]
    fn test_expand_holds_samples() {
        let v = Vector::from_data(vec![1.0, 2.0, 3.0]);
        let e = CompressionPolicy::expand(&v, 4);
        assert_eq!(e.data(), &[1.0, 1.0, 2.0, 3.0]);
        assert_eq!(CompressionPolicy::expand(&v, 3), v);
    }

    #[test]
    fn test_quantize_clamps() {
        let q = CompressionPolicy::quantize(&Vector::from_data(vec![-3.0, 0.0, 3.0]));
        assert_eq!(q[0], -1.0);
        assert_eq!(q[2], 1.0);
        assert!(q[1].abs() <= 1.0 / 255.0 + 1e-12);
    }

    #[test]
    fn test_downsample_preserves_mean() {
        let v = Vector::from_data((0..8).map(|i| i as f64).collect());
        let d = CompressionPolicy::downsample(&v, 0.5);
        assert_eq!(d.data(), &[0.5, 2.5, 4.5, 6.5]);
    }

    #[test]
    fn test_downsample_fractional_ratio() {
        let v = Vector::from_data(vec![1.0, 1.0, 1.0, 1.0]);
        let d = CompressionPolicy::downsample(&v, 0.75);
        assert_eq!(d.dimensions(), 3);
        assert!(d.data().iter().all(|&x| (x - 1.0).abs() < 1e-12));
    }
}
