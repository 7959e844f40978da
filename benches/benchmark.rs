//! Run with:
//! ```bash
//! RUSTFLAGS="-C target-cpu=native" cargo bench --bench benchmark
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use vaned::simd::SimdLevel;
use vaned::{column, groupby, join, kernel, stats};

/// Number of rows in the index for the main benchmarks.
const N_ROWS: usize = 1_000_000;
/// Fixed RNG seed for reproducible benchmarks.
const SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

const LEVELS: [SimdLevel; 4] = [
    SimdLevel::Scalar,
    SimdLevel::Vector128,
    SimdLevel::Vector256,
    SimdLevel::Vector512,
];

/// Generate `n` random `f64`s, seeded so benchmark comparisons are
/// statistically valid across runs.
fn generate_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect()
}

fn generate_i64_keys(n: usize, cardinality: i64, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..cardinality)).collect()
}

/// Measures `sum` at every dispatch level, to quantify the speedup the
/// unrolled accumulator gets from wider lanes.
fn bench_sum_by_simd_level(c: &mut Criterion) {
    let data = generate_f64(N_ROWS, SEED);

    let mut group = c.benchmark_group("reduce_sum");
    group.throughput(Throughput::Elements(N_ROWS as u64));
    for level in LEVELS {
        group.bench_with_input(BenchmarkId::new(level.name(), N_ROWS), &level, |b, &level| {
            b.iter(|| black_box(kernel::reduce::sum(black_box(&data), level)))
        });
    }
    group.finish();
}

/// Measures how `filter_gt` latency scales with row count.
/// Expected: linear scaling — each added row costs one comparison.
fn bench_filter_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_scaling");
    for n in [10_000usize, 100_000, 1_000_000] {
        let data = generate_f64(n, SEED);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _n| {
            b.iter(|| black_box(kernel::filter::filter_gt(black_box(&data), 0.0)))
        });
    }
    group.finish();
}

/// Measures end-to-end grouped sum: hash, build the probe table, aggregate.
fn bench_group_by_sum(c: &mut Criterion) {
    let keys = generate_i64_keys(N_ROWS, 10_000, SEED);
    let values = generate_f64(N_ROWS, SEED + 1);

    let mut group = c.benchmark_group("group_by_sum");
    group.throughput(Throughput::Elements(N_ROWS as u64));
    group.bench_function(BenchmarkId::new("group_by_sum", N_ROWS), |b| {
        b.iter(|| black_box(groupby::group_by_sum(black_box(&keys), black_box(&values))))
    });
    group.finish();
}

/// Measures inner-join latency for two equal-size key streams with a fixed
/// join cardinality, which bounds ingestion-time join workloads.
fn bench_inner_join(c: &mut Criterion) {
    let left = generate_i64_keys(N_ROWS, 50_000, SEED);
    let right = generate_i64_keys(N_ROWS, 50_000, SEED + 1);

    let mut group = c.benchmark_group("inner_join");
    group.throughput(Throughput::Elements(N_ROWS as u64));
    group.bench_function(BenchmarkId::new("inner_join", N_ROWS), |b| {
        b.iter(|| black_box(join::inner_join(black_box(&left), black_box(&right), usize::MAX)))
    });
    group.finish();
}

/// Compares chunked-column `sum` against a flat-slice `sum` over the same
/// data, to quantify the per-chunk dispatch overhead.
fn bench_chunked_vs_flat_sum(c: &mut Criterion) {
    let data = generate_f64(N_ROWS, SEED);
    let chunked = column::ChunkedColumn::from_slice(&data);

    let mut group = c.benchmark_group("chunked_vs_flat_sum");
    group.throughput(Throughput::Elements(N_ROWS as u64));
    group.bench_function("flat", |b| {
        b.iter(|| black_box(kernel::reduce::sum(black_box(&data), SimdLevel::Vector256)))
    });
    group.bench_function("chunked", |b| b.iter(|| black_box(chunked.sum())));
    group.finish();
}

/// Measures `stats::correlation` over two equal-length series, the most
/// expensive of the textbook formulas (two full passes plus the mean pass
/// each relies on).
fn bench_correlation(c: &mut Criterion) {
    let a = generate_f64(N_ROWS, SEED);
    let b_data = generate_f64(N_ROWS, SEED + 2);

    let mut group = c.benchmark_group("correlation");
    group.throughput(Throughput::Elements(N_ROWS as u64));
    group.bench_function(BenchmarkId::new("pearson", N_ROWS), |b| {
        b.iter(|| black_box(stats::correlation(black_box(&a), black_box(&b_data))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_sum_by_simd_level,
    bench_filter_scaling,
    bench_group_by_sum,
    bench_inner_join,
    bench_chunked_vs_flat_sum,
    bench_correlation,
);
criterion_main!(benches);
