//! Process-global runtime tunables.
//!
//! SIMD level and max-threads are the only tunables meant for embedders,
//! both process-global, both "configure before run" rather than per-call
//! overrides. This module additionally holds the parallel-dispatch
//! thresholds (`T_par`, `G`) and the chunked-column chunk size `C`, which
//! are conceptually fixed constants but which this crate exposes as
//! overridable statics purely so tests can exercise the parallel path on
//! small inputs without allocating gigabytes of test data — production
//! callers should leave them at the documented defaults.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default element-count threshold above which the parallel driver
/// partitions work across Blitz instead of running inline.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100_000;

/// Default target elements per parallel task (`G`).
pub const DEFAULT_GROUP_SIZE: usize = 4096;

/// Default chunk length for `ChunkedColumn` (`C`), chosen so a chunk of
/// `f64` (8 bytes) plus working set fits in a typical 256 KiB-1 MiB L2:
/// `8192 * 8 = 64 KiB`.
pub const DEFAULT_CHUNK_LEN: usize = 8192;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);
static GROUP_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_GROUP_SIZE);
static CHUNK_LEN: AtomicUsize = AtomicUsize::new(DEFAULT_CHUNK_LEN);

/// Returns the current sequential/parallel crossover point, in elements.
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Overrides the sequential/parallel crossover point. Intended for tests
/// that want to force the parallel path on small arrays; production
/// embedders should not need this.
pub fn set_parallel_threshold(elements: usize) {
    PARALLEL_THRESHOLD.store(elements, Ordering::Relaxed);
}

/// Returns the current target task granularity, in elements, used to split
/// a parallel operation's range across Blitz workers.
pub fn group_size() -> usize {
    GROUP_SIZE.load(Ordering::Relaxed)
}

/// Overrides the target task granularity.
pub fn set_group_size(elements: usize) {
    GROUP_SIZE.store(elements.max(1), Ordering::Relaxed);
}

/// Returns the current `ChunkedColumn` chunk length.
pub fn chunk_len() -> usize {
    CHUNK_LEN.load(Ordering::Relaxed)
}

/// Overrides the `ChunkedColumn` chunk length. Only new columns are
/// affected; existing `ChunkedColumn` instances keep whatever length they
/// were built with.
pub fn set_chunk_len(elements: usize) {
    CHUNK_LEN.store(elements.max(1), Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        assert_eq!(parallel_threshold(), DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(group_size(), DEFAULT_GROUP_SIZE);
        assert_eq!(chunk_len(), DEFAULT_CHUNK_LEN);
    }

    #[test]
    fn overrides_round_trip() {
        set_parallel_threshold(10);
        assert_eq!(parallel_threshold(), 10);
        set_parallel_threshold(DEFAULT_PARALLEL_THRESHOLD);

        set_group_size(16);
        assert_eq!(group_size(), 16);
        set_group_size(DEFAULT_GROUP_SIZE);

        set_chunk_len(128);
        assert_eq!(chunk_len(), 128);
        set_chunk_len(DEFAULT_CHUNK_LEN);
    }
}
