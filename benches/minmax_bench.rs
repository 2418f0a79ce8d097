use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minmax::generate::generate;
use minmax::pipeline::{self, local_bounds};
use std::hint::black_box;

const SAMPLES: usize = 1_000_000;
const SEED: u64 = 42;

// ============================================================================
// TIER 1: FULL PIPELINE BENCHMARKS (Primary Baseline)
// ============================================================================

/// Serial reduce + normalize over a fresh copy of the input
fn bench_serial(c: &mut Criterion) {
    let input = generate(SAMPLES, SEED);
    let mut group = c.benchmark_group("serial");

    group.bench_function("1m", |b| {
        b.iter_batched_ref(
            || input.clone(),
            |data| black_box(pipeline::run_serial(black_box(data))),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Shared-memory strategy at increasing pool sizes
fn bench_threaded(c: &mut Criterion) {
    let input = generate(SAMPLES, SEED);
    let mut group = c.benchmark_group("threaded");

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter_batched_ref(
                || input.clone(),
                |data| black_box(pipeline::run_threaded(black_box(data), workers).unwrap()),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Message-passing strategy, including generation and gather
fn bench_distributed(c: &mut Criterion) {
    let mut group = c.benchmark_group("distributed");
    group.sample_size(20);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| black_box(pipeline::run_distributed(SAMPLES, workers, SEED, false).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// TIER 2: COMPONENT-LEVEL BENCHMARKS (Diagnostic)
// ============================================================================

/// Local reducer scan alone
fn bench_local_bounds(c: &mut Criterion) {
    let input = generate(SAMPLES, SEED);
    let mut group = c.benchmark_group("local_bounds");

    group.bench_function("1m", |b| {
        b.iter(|| black_box(local_bounds(black_box(&input))));
    });

    group.finish();
}

// ============================================================================
// BENCHMARK REGISTRATION
// ============================================================================

criterion_group!(
    benches,
    // Primary baseline (these run by default with `cargo bench`)
    bench_serial,
    bench_threaded,
    bench_distributed,
    // Diagnostic benchmarks (help identify bottlenecks)
    bench_local_bounds,
);

criterion_main!(benches);
