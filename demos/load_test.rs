//! ```bash
//! RUSTFLAGS="-C target-cpu=native" cargo run --example load_test --release
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;
use vaned::column::Column;
use vaned::simd::SimdLevel;
use vaned::{column, groupby, join, kernel};

/// Number of rows to generate for the load test.
const N_ROWS: usize = 5_000_000;
/// Cardinality of the synthetic group-by/join keys.
const KEY_CARDINALITY: i64 = 100_000;
/// Deterministic seed for reproducibility.
const SEED: u64 = 42;

fn fmt_bytes(n: u64) -> String {
    match n {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.2} KiB", b as f64 / 1024.0),
        b if b < 1024 * 1024 * 1024 => format!("{:.2} MiB", b as f64 / (1024.0 * 1024.0)),
        b => format!("{:.2} GiB", b as f64 / (1024.0 * 1024.0 * 1024.0)),
    }
}

fn divider() {
    println!("{}", "─".repeat(60));
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║           vaned Load Test & Persistence Verifier          ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    // ── Phase 1: Data generation ──────────────────────────────────────────
    divider();
    println!("Phase 1 — Generating random columns");
    println!("  Rows:         {N_ROWS}");
    println!("  Raw data:     {} (uncompressed, f64)", fmt_bytes((N_ROWS * 8) as u64));

    let t0 = Instant::now();
    let mut rng = StdRng::seed_from_u64(SEED);
    let values: Vec<f64> = (0..N_ROWS).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();
    let mut key_rng = StdRng::seed_from_u64(SEED + 1);
    let keys: Vec<i64> = (0..N_ROWS).map(|_| key_rng.gen_range(0..KEY_CARDINALITY)).collect();
    println!("  Generated in {:?}", t0.elapsed());

    // ── Phase 2: Kernel throughput ─────────────────────────────────────────
    divider();
    println!("Phase 2 — Reduction and filter throughput");

    let t0 = Instant::now();
    let total = kernel::reduce::sum(&values, SimdLevel::Vector256);
    let sum_duration = t0.elapsed();
    println!("  sum()       = {total:.6} in {sum_duration:?}");
    println!(
        "  Throughput: {:.0} rows/sec",
        N_ROWS as f64 / sum_duration.as_secs_f64()
    );

    let t0 = Instant::now();
    let (_, matches) = kernel::filter::filter_gt(&values, 0.5);
    let filter_duration = t0.elapsed();
    println!("  filter_gt() matched {matches} rows in {filter_duration:?}");

    // ── Phase 3: Group-by ──────────────────────────────────────────────────
    divider();
    println!("Phase 3 — Grouped sum over {KEY_CARDINALITY} distinct keys");

    let t0 = Instant::now();
    let grouped = groupby::group_by_sum(&keys, &values);
    let groupby_duration = t0.elapsed();
    println!("  Produced {} groups in {:?}", grouped.keys.len(), groupby_duration);
    println!(
        "  Throughput: {:.0} rows/sec",
        N_ROWS as f64 / groupby_duration.as_secs_f64()
    );

    // ── Phase 4: Join ───────────────────────────────────────────────────────
    divider();
    println!("Phase 4 — Inner join against a same-cardinality key stream");

    let mut right_rng = StdRng::seed_from_u64(SEED + 2);
    let right_keys: Vec<i64> = (0..N_ROWS / 10).map(|_| right_rng.gen_range(0..KEY_CARDINALITY)).collect();

    let t0 = Instant::now();
    let join_result = join::inner_join(&keys, &right_keys, usize::MAX)?;
    let join_duration = t0.elapsed();
    println!("  Produced {} matched pairs in {:?}", join_result.num_matches, join_duration);

    // ── Phase 5: Serialization ───────────────────────────────────────────────
    divider();
    println!("Phase 5 — Saving the value column to disk (bincode)");

    let tmp_path = std::env::temp_dir().join("vaned_load_test_column.bin");
    let col = Column::from_slice(&values);

    let t0 = Instant::now();
    col.save(&tmp_path)?;
    let save_duration = t0.elapsed();
    let file_size = std::fs::metadata(&tmp_path)?.len();

    println!("  Saved to:   {}", tmp_path.display());
    println!("  File size:  {}", fmt_bytes(file_size));
    println!("  Saved in:   {save_duration:?}");
    println!(
        "  Write throughput: {:.0} MB/s",
        file_size as f64 / save_duration.as_secs_f64() / 1_000_000.0
    );

    // ── Phase 6: Deserialization ──────────────────────────────────────────────
    divider();
    println!("Phase 6 — Loading the column back from disk");

    let t0 = Instant::now();
    let loaded: Column<f64> = Column::load(&tmp_path)?;
    let load_duration = t0.elapsed();
    println!("  Loaded in:  {load_duration:?}");
    println!(
        "  Read throughput: {:.0} MB/s",
        file_size as f64 / load_duration.as_secs_f64() / 1_000_000.0
    );
    println!("  Rows in loaded column: {}", loaded.len());

    // ── Phase 7: Integrity verification ───────────────────────────────────────
    divider();
    println!("Phase 7 — Verifying round-trip integrity");

    let mismatches = loaded
        .as_slice()
        .iter()
        .zip(values.iter())
        .filter(|(a, b)| a.to_bits() != b.to_bits())
        .count();
    let reloaded_sum = kernel::reduce::sum(loaded.as_slice(), SimdLevel::Scalar);
    let sum_delta = (reloaded_sum - total).abs();

    println!("  Bitwise mismatches: {mismatches}/{N_ROWS}");
    println!("  Sum delta after round-trip: {sum_delta:.2e}");

    // ── Phase 8: Chunked column sanity check ────────────────────────────────
    divider();
    println!("Phase 8 — ChunkedColumn cross-check");

    let chunked = column::ChunkedColumn::from_slice(&values);
    let chunked_sum = chunked.sum();
    let chunked_delta = (chunked_sum - total).abs();
    println!("  ChunkedColumn sum delta vs flat sum: {chunked_delta:.2e}");

    // ── Phase 9: Summary ─────────────────────────────────────────────────────
    divider();
    if mismatches == 0 {
        println!("✅ Round-trip integrity: PASSED");
    } else {
        println!("❌ Round-trip integrity: FAILED ({mismatches} mismatches)");
    }

    println!();
    println!("Performance Summary");
    println!("──────────────────────────────────────────────────");
    println!("  sum() throughput:        {:.0} rows/s", N_ROWS as f64 / sum_duration.as_secs_f64());
    println!(
        "  group_by_sum throughput: {:.0} rows/s",
        N_ROWS as f64 / groupby_duration.as_secs_f64()
    );
    println!("  join latency:            {join_duration:?}");
    println!(
        "  Serialization speed:     {:.0} MB/s",
        file_size as f64 / save_duration.as_secs_f64() / 1_000_000.0
    );
    println!(
        "  Deserialization speed:   {:.0} MB/s",
        file_size as f64 / load_duration.as_secs_f64() / 1_000_000.0
    );
    println!("──────────────────────────────────────────────────");

    let _ = std::fs::remove_file(&tmp_path);

    Ok(())
}
