//! Benchmarks for holomem operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use holomem::kernel::PromptDeriver;
use holomem::memory::{MemoryDraft, MemoryType};
use holomem::state::{StateView, SystemState};
use holomem::{
    CognitiveRouter, ComputeScopeOptimizer, FeedbackTrainer, HolomemConfig, MemoryStore,
    ProcessContext, Similarity, Vector, VectorEncoder,
};
use std::sync::Arc;

const DIMENSIONS: usize = 10_000;

fn config() -> HolomemConfig {
    HolomemConfig {
        dimensions: DIMENSIONS,
        seed: Some(7),
        ..HolomemConfig::default()
    }
}

fn sample(seed: u64) -> Vector {
    let deriver = PromptDeriver::with_seed(DIMENSIONS, seed);
    Vector::from_data(deriver.derive("bench").as_ref().clone())
}

// =============================================================================
// Kernel
// =============================================================================

fn benchmark_create_pattern_vector(c: &mut Criterion) {
    let encoder = VectorEncoder::from_config(&config());
    let data = sample(1).into_data();

    c.bench_function("create_pattern_vector", |b| {
        b.iter(|| encoder.create_pattern_vector(black_box(&data)))
    });
}

fn benchmark_bind(c: &mut Criterion) {
    let encoder = VectorEncoder::from_config(&config());
    let a = sample(1);
    let b_vec = sample(2);

    c.bench_function("multi_dimensional_bind", |b| {
        b.iter(|| encoder.multi_dimensional_bind(black_box(&[&a, &b_vec])))
    });
}

fn benchmark_similarity(c: &mut Criterion) {
    let a = sample(1);
    let b_vec = sample(2);

    c.bench_function("cosine", |b| {
        b.iter(|| Similarity::cosine(black_box(&a), black_box(&b_vec)))
    });
}

fn benchmark_compression(c: &mut Criterion) {
    let config = HolomemConfig {
        memory_limit_kib: 1,
        ..config()
    };
    let encoder = VectorEncoder::from_config(&config);
    let v = sample(3);

    c.bench_function("optimize_vector_compressed", |b| {
        b.iter(|| encoder.optimize_vector(black_box(&v)))
    });
}

// =============================================================================
// Memory
// =============================================================================

fn benchmark_recall(c: &mut Criterion) {
    let config = config();
    let store = MemoryStore::new(
        &config,
        VectorEncoder::from_config(&config),
        StateView::fixed(SystemState::Full),
    );
    for i in 0..200 {
        store
            .store(MemoryDraft::new(sample(i), MemoryType::Episodic))
            .unwrap();
    }
    let query = sample(999);

    c.bench_function("recall_top5_of_200", |b| {
        b.iter(|| store.recall(black_box(&query), None, Some(5)))
    });
}

fn benchmark_constrained_store(c: &mut Criterion) {
    let config = HolomemConfig {
        dimensions: 256,
        ..config()
    };
    let store = MemoryStore::new(
        &config,
        VectorEncoder::from_config(&config),
        StateView::fixed(SystemState::Constrained),
    );
    let v = Vector::from_data(vec![1.0; 256]);

    c.bench_function("constrained_store", |b| {
        b.iter(|| store.store(MemoryDraft::new(black_box(v.clone()), MemoryType::Pattern)))
    });
}

// =============================================================================
// Cognition
// =============================================================================

fn benchmark_route(c: &mut Criterion) {
    let config = config();
    let router = CognitiveRouter::new(&config, ComputeScopeOptimizer::from_config(&config));
    let input = sample(4);

    c.bench_function("router_process", |b| {
        b.iter(|| router.process(black_box(&input), &ProcessContext::default()))
    });
}

fn benchmark_evaluate(c: &mut Criterion) {
    let config = HolomemConfig {
        history_capacity: 20,
        ..config()
    };
    let router = Arc::new(CognitiveRouter::new(
        &config,
        ComputeScopeOptimizer::from_config(&config),
    ));
    let mut trainer = FeedbackTrainer::new(&config, router);
    let input = sample(5);
    let expected = sample(6);

    c.bench_function("evaluate_performance", |b| {
        b.iter(|| trainer.evaluate_performance(black_box(&input), black_box(&expected)))
    });
}

criterion_group!(
    benches,
    benchmark_create_pattern_vector,
    benchmark_bind,
    benchmark_similarity,
    benchmark_compression,
    benchmark_recall,
    benchmark_constrained_store,
    benchmark_route,
    benchmark_evaluate,
);

criterion_main!(benches);
