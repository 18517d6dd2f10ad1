//! Prompt Deriver: deterministic prompt → numeric data mapping.
//!
//! The same prompt text ALWAYS produces the SAME values, which makes
//! personality vectors reproducible without an embedding service.

use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Prompts kept in the cache before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct PromptCache {
    entries: HashMap<String, Arc<Vec<f64>>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Maps prompt text to `dimensions` uniform values in [0, 1).
///
/// Uses deterministic hash-based seeding to ensure reproducibility. At most
/// `cache_capacity` prompts are cached; eviction is first-in first-out.
#[derive(Clone, Debug)]
pub struct PromptDeriver {
    dimensions: usize,
    global_seed: u64,
    cache_capacity: usize,
    cache: Arc<RwLock<PromptCache>>,
}

impl PromptDeriver {
    pub fn new(dimensions: usize) -> Self {
        Self::with_seed(dimensions, 0)
    }

    pub fn with_seed(dimensions: usize, global_seed: u64) -> Self {
        Self {
            dimensions,
            global_seed,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache: Arc::new(RwLock::new(PromptCache::default())),
        }
    }

    /// Zero disables caching.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the data for a prompt, computing and caching it on first use.
    pub fn derive(&self, prompt: &str) -> Arc<Vec<f64>> {
        if let Some(data) = self.cache.read().entries.get(prompt) {
            return Arc::clone(data);
        }

        let data = Arc::new(self.compute(prompt));
        if self.cache_capacity == 0 {
            return data;
        }
        let mut cache = self.cache.write();
        if cache.entries.contains_key(prompt) {
            return data;
        }
        while cache.entries.len() >= self.cache_capacity {
            match cache.order.pop_front() {
                Some(oldest) => {
                    cache.entries.remove(&oldest);
                }
                None => break,
            }
        }
        cache.entries.insert(prompt.to_string(), Arc::clone(&data));
        cache.order.push_back(prompt.to_string());
        data
    }

    /// SHA-256 of (global_seed || prompt) seeds a ChaCha8 stream.
    fn compute(&self, prompt: &str) -> Vec<f64> {
        let mut hasher = Sha256::new();
        hasher.update(self.global_seed.to_le_bytes());
        hasher.update(prompt.as_bytes());
        let hash = hasher.finalize();

        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hash[0..8]);
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed));

        (0..self.dimensions).map(|_| rng.gen::<f64>()).collect()
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        cache.entries.clear();
        cache.order.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.read().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = PromptDeriver::with_seed(256, 42);
        let b = PromptDeriver::with_seed(256, 42);
        assert_eq!(a.derive("hello"), b.derive("hello"));
    }

    #[test]
    fn test_different_prompts() {
        let d = PromptDeriver::new(256);
        assert_ne!(d.derive("hello"), d.derive("world"));
    }

    #[test]
    fn test_values_in_unit_interval() {
        let d = PromptDeriver::new(512);
        let data = d.derive("range");
        assert_eq!(data.len(), 512);
        assert!(data.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_caching() {
        let d = PromptDeriver::new(16);
        assert_eq!(d.cache_size(), 0);
        d.derive("a");
        d.derive("a");
        assert_eq!(d.cache_size(), 1);
        d.derive("b");
        assert_eq!(d.cache_size(), 2);
        d.clear_cache();
        assert_eq!(d.cache_size(), 0);
    }

    #[test]
    fn test_cache_is_bounded() {
        let d = PromptDeriver::new(8).with_cache_capacity(3);
        let first = d.derive("p0");
        for i in 1..10 {
            d.derive(&format!("p{}", i));
            assert!(d.cache_size() <= 3);
        }
        assert_eq!(d.cache_size(), 3);
        // Evicted prompts are recomputed to the same values.
        assert_eq!(d.derive("p0"), first);

        let uncached = PromptDeriver::new(8).with_cache_capacity(0);
        uncached.derive("a");
        assert_eq!(uncached.cache_size(), 0);
    }
}
