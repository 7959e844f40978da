//! `ChunkedColumn`: an ordered sequence of fixed-capacity `f64` chunks
//! sized so one chunk plus its working set is L2-resident. Chunk
//! boundaries double as parallel task boundaries —
//! aggregations, filters, and sorts all dispatch one task per chunk
//! through [`crate::blitz`] rather than re-deriving their own partitioning
//! over the flattened column.

use crate::blitz::driver;
use crate::kernel;

struct SendConstPtr<T>(*const T);
unsafe impl<T: Sync> Send for SendConstPtr<T> {}
unsafe impl<T: Sync> Sync for SendConstPtr<T> {}

struct SendMutPtr<T>(*mut T);
unsafe impl<T: Send> Send for SendMutPtr<T> {}
unsafe impl<T: Send> Sync for SendMutPtr<T> {}

/// One `f64` chunk. A `Box<[f64]>` rather than `Vec<f64>` — its length is
/// fixed at construction and never grows in place.
pub type Chunk = Box<[f64]>;

/// An ordered, owned sequence of `f64` chunks.
/// All but possibly the last chunk have exactly `chunk_len` elements; the
/// concatenation of chunks in order equals the logical column.
#[derive(Debug, Clone)]
pub struct ChunkedColumn {
    chunks: Vec<Chunk>,
    len: usize,
    chunk_len: usize,
}

/// Runs `local` once per chunk, fanned across Blitz when there is more
/// than one chunk, and folds the per-chunk results sequentially with
/// `combine`. This is the chunk-granularity counterpart to
/// [`crate::blitz::driver::maybe_parallel_reduce`], which partitions a
/// flat slice by element count instead of by pre-existing chunk boundary.
fn chunk_parallel_reduce<Acc, Local, Combine>(chunks: &[Chunk], identity: Acc, local: Local, combine: Combine) -> Acc
where
    Acc: Copy + Send,
    Local: Fn(&[f64]) -> Acc + Sync,
    Combine: Fn(Acc, Acc) -> Acc,
{
    let n = chunks.len();
    if n == 0 {
        return identity;
    }
    if n == 1 {
        return local(&chunks[0]);
    }

    let mut partials = vec![identity; n];
    let chunks_ptr = SendConstPtr(chunks.as_ptr());
    let partials_ptr = SendMutPtr(partials.as_mut_ptr());

    driver::parallel_for(n, 1, move |range| {
        for i in range {
            // SAFETY: `i < n`; each chunk index is handled by exactly one
            // task, so `partials[i]` is never written concurrently.
            let chunk = unsafe { &*chunks_ptr.0.add(i) };
            let value = local(chunk);
            unsafe {
                *partials_ptr.0.add(i) = value;
            }
        }
    });

    partials.into_iter().fold(identity, combine)
}

impl ChunkedColumn {
    /// Copies `data` into `⌈L / C⌉` chunks using the process-wide default
    /// chunk length ([`crate::config::chunk_len`]).
    pub fn from_slice(data: &[f64]) -> Self {
        Self::with_chunk_len(data, crate::config::chunk_len())
    }

    /// As [`Self::from_slice`], but with an explicit chunk length —
    /// intended for tests that want to exercise multi-chunk behaviour
    /// without allocating a full-size column — the chunk length is
    /// otherwise fixed by [`crate::config::chunk_len`].
    pub fn with_chunk_len(data: &[f64], chunk_len: usize) -> Self {
        let chunk_len = chunk_len.max(1);
        let chunks: Vec<Chunk> = data.chunks(chunk_len).map(|c| c.to_vec().into_boxed_slice()).collect();
        Self {
            chunks,
            len: data.len(),
            chunk_len,
        }
    }

    fn from_chunks(chunks: Vec<Chunk>, len: usize, chunk_len: usize) -> Self {
        Self { chunks, len, chunk_len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// `data[i / chunk_len][i % chunk_len]`.
    pub fn get(&self, index: usize) -> f64 {
        self.chunks[index / self.chunk_len][index % self.chunk_len]
    }

    /// Concatenated write of chunks in order.
    pub fn copy_to_slice(&self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.len);
        let mut offset = 0;
        for chunk in &self.chunks {
            out[offset..offset + chunk.len()].copy_from_slice(chunk);
            offset += chunk.len();
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len];
        self.copy_to_slice(&mut out);
        out
    }

    /// Chunk-parallel sum: one task per chunk, partial sums combined
    /// sequentially.
    pub fn sum(&self) -> f64 {
        let level = crate::simd::level();
        chunk_parallel_reduce(&self.chunks, 0.0, move |c| kernel::reduce::sum(c, level), |a, b| a + b)
    }

    /// Chunk-parallel min, ignoring NaN chunks the way [`kernel::reduce::min`]
    /// ignores NaN elements.
    pub fn min(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let level = crate::simd::level();
        chunk_parallel_reduce(
            &self.chunks,
            None,
            move |c| kernel::reduce::min(c, level),
            |a, b| match (a, b) {
                (None, x) | (x, None) => x,
                (Some(x), Some(y)) => Some(kernel::reduce::combine_min(x, y)),
            },
        )
    }

    pub fn max(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let level = crate::simd::level();
        chunk_parallel_reduce(
            &self.chunks,
            None,
            move |c| kernel::reduce::max(c, level),
            |a, b| match (a, b) {
                (None, x) | (x, None) => x,
                (Some(x), Some(y)) => Some(kernel::reduce::combine_max(x, y)),
            },
        )
    }

    /// Mean, accumulating `(sum, count)` per chunk.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let level = crate::simd::level();
        let (sum, count) = chunk_parallel_reduce(
            &self.chunks,
            (0.0f64, 0usize),
            move |c| (kernel::reduce::sum(c, level), c.len()),
            |(s1, c1), (s2, c2)| (s1 + s2, c1 + c2),
        );
        Some(sum / count as f64)
    }

    /// A new chunked column holding only the rows where `data[i] > threshold`,
    /// re-chunked to restore the "all but last chunk is full" invariant.
    /// Per-chunk mask + compaction into value buffers, concatenated and
    /// rebuilt via [`Self::from_compacted`] — row order is preserved.
    pub fn filter_gt(&self, threshold: f64) -> ChunkedColumn {
        self.filter_with(move |v| v > threshold)
    }

    /// As [`Self::filter_gt`], for `data[i] < threshold`.
    pub fn filter_lt(&self, threshold: f64) -> ChunkedColumn {
        self.filter_with(move |v| v < threshold)
    }

    fn filter_with<P>(&self, predicate: P) -> ChunkedColumn
    where
        P: Fn(f64) -> bool + Sync,
    {
        let n = self.chunks.len();
        if n == 0 {
            return Self::from_compacted(Vec::new(), self.chunk_len);
        }

        // Pass 1: per-chunk match count.
        let counts: Vec<usize> = chunk_counts(&self.chunks, &predicate);

        // Exclusive prefix sum gives each chunk's base offset into the
        // compacted value array (same rule as `driver::maybe_parallel_filter`,
        // applied at chunk rather than sub-range granularity).
        let mut offsets = vec![0usize; n + 1];
        for i in 0..n {
            offsets[i + 1] = offsets[i] + counts[i];
        }
        let total = offsets[n];
        let mut out = vec![0.0f64; total];

        let chunks_ptr = SendConstPtr(self.chunks.as_ptr());
        let out_ptr = SendMutPtr(out.as_mut_ptr());
        let offsets_ref = &offsets;
        let pred_ref = &predicate;

        driver::parallel_for(n, 1, move |range| {
            for ci in range {
                // SAFETY: `ci < n`; each chunk writes only within
                // `[offsets[ci], offsets[ci + 1])`, a disjoint reserved
                // sub-range of `out`.
                let chunk = unsafe { &*chunks_ptr.0.add(ci) };
                let mut w = offsets_ref[ci];
                for &v in chunk.iter() {
                    if pred_ref(v) {
                        unsafe {
                            *out_ptr.0.add(w) = v;
                        }
                        w += 1;
                    }
                }
            }
        });

        Self::from_compacted(out, self.chunk_len)
    }

    /// Per-chunk local argsort in parallel, then a k-way merge across the
    /// chunk-local sorted runs by value, producing a permutation of
    /// `[0, len)` in global row indices — stable.
    pub fn argsort(&self, ascending: bool) -> Vec<i32> {
        if self.is_empty() {
            return Vec::new();
        }
        let level = crate::simd::level();
        let local_perms: Vec<Vec<i32>> = {
            let n = self.chunks.len();
            let mut perms: Vec<Vec<i32>> = vec![Vec::new(); n];
            let chunks_ptr = SendConstPtr(self.chunks.as_ptr());
            let perms_ptr = SendMutPtr(perms.as_mut_ptr());
            driver::parallel_for(n, 1, move |range| {
                for i in range {
                    let chunk = unsafe { &*chunks_ptr.0.add(i) };
                    let perm = kernel::sort::argsort(chunk, ascending, level);
                    unsafe {
                        *perms_ptr.0.add(i) = perm;
                    }
                }
            });
            perms
        };

        k_way_merge_by_value(&self.chunks, &local_perms, self.chunk_len, ascending)
    }

    /// `sort(data)`: `gather(data, argsort(data, ascending))`, materialised
    /// as a fresh `ChunkedColumn` with the same chunk length.
    pub fn sort(&self, ascending: bool) -> ChunkedColumn {
        let perm = self.argsort(ascending);
        let data = self.to_vec();
        let sorted = kernel::gather::gather_to_vec(&data, &perm);
        ChunkedColumn::with_chunk_len(&sorted, self.chunk_len)
    }

    /// Rebuilds a chunked column out of pre-formed chunks of arbitrary
    /// lengths (used internally by filter, which produces a variable
    /// number of kept rows per source chunk), re-chunking to restore the
    /// "all but last chunk is full" invariant.
    pub fn from_compacted(data: Vec<f64>, chunk_len: usize) -> Self {
        let len = data.len();
        let chunks: Vec<Chunk> = data.chunks(chunk_len.max(1)).map(|c| c.to_vec().into_boxed_slice()).collect();
        Self::from_chunks(chunks, len, chunk_len.max(1))
    }
}

fn chunk_counts<P>(chunks: &[Chunk], predicate: &P) -> Vec<usize>
where
    P: Fn(f64) -> bool + Sync,
{
    let n = chunks.len();
    let mut counts = vec![0usize; n];
    let chunks_ptr = SendConstPtr(chunks.as_ptr());
    let counts_ptr = SendMutPtr(counts.as_mut_ptr());
    let pred_ref = predicate;

    driver::parallel_for(n, 1, move |range| {
        for i in range {
            let chunk = unsafe { &*chunks_ptr.0.add(i) };
            let c = chunk.iter().filter(|&&v| pred_ref(v)).count();
            unsafe {
                *counts_ptr.0.add(i) = c;
            }
        }
    });
    counts
}

/// Merges `K` chunk-local sorted runs (each a permutation of its own
/// chunk's local indices) into one global, stable permutation of `[0, L)`.
/// A straightforward K-way merge via repeated linear scan over run heads —
/// `K` is the chunk count, which is small (`L / 8192`), so this stays
/// `O(L)` with a negligible constant rather than needing a heap.
fn k_way_merge_by_value(chunks: &[Chunk], local_perms: &[Vec<i32>], chunk_len: usize, ascending: bool) -> Vec<i32> {
    let k = chunks.len();
    let mut cursors = vec![0usize; k];
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let mut out = Vec::with_capacity(total);

    loop {
        let mut best: Option<usize> = None;
        for run in 0..k {
            if cursors[run] >= local_perms[run].len() {
                continue;
            }
            let candidate_value = chunks[run][local_perms[run][cursors[run]] as usize];
            best = match best {
                None => Some(run),
                Some(b) => {
                    let best_value = chunks[b][local_perms[b][cursors[b]] as usize];
                    let better = if ascending {
                        candidate_value < best_value
                    } else {
                        candidate_value > best_value
                    };
                    if better {
                        Some(run)
                    } else {
                        Some(b)
                    }
                }
            };
        }
        match best {
            None => break,
            Some(run) => {
                let local_idx = local_perms[run][cursors[run]];
                out.push((run * chunk_len) as i32 + local_idx);
                cursors[run] += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_round_trips_exactly() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let col = ChunkedColumn::with_chunk_len(&data, 8192);
        assert_eq!(col.chunk_count(), 1);
        assert_eq!(col.to_vec(), data);
        assert_eq!(col.sum(), 10.0);
        assert_eq!(col.min(), Some(1.0));
        assert_eq!(col.max(), Some(4.0));
        assert_eq!(col.mean(), Some(2.5));
    }

    #[test]
    fn multi_chunk_aggregation_matches_flat_aggregation() {
        let data: Vec<f64> = (0..10_000).map(|i| (i as f64 * 0.37).sin()).collect();
        let col = ChunkedColumn::with_chunk_len(&data, 64);
        assert!(col.chunk_count() > 1);
        let level = crate::simd::level();
        let flat_sum = kernel::reduce::sum(&data, level);
        assert!((col.sum() - flat_sum).abs() < 1e-6 * data.len() as f64);
        assert_eq!(col.min(), kernel::reduce::min(&data, level));
        assert_eq!(col.max(), kernel::reduce::max(&data, level));
    }

    #[test]
    fn get_matches_chunk_and_offset_formula() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let col = ChunkedColumn::with_chunk_len(&data, 7);
        for i in 0..data.len() {
            assert_eq!(col.get(i), data[i]);
        }
    }

    #[test]
    fn filter_gt_keeps_matching_values_in_order() {
        let data: Vec<f64> = (0..500).map(|i| (i % 11) as f64).collect();
        let col = ChunkedColumn::with_chunk_len(&data, 32);
        let filtered = col.filter_gt(5.0);
        let (flat_idx, flat_count) = kernel::filter::filter_gt(&data, 5.0);
        let expected: Vec<f64> = flat_idx.iter().map(|&i| data[i as usize]).collect();
        assert_eq!(filtered.len(), flat_count);
        assert_eq!(filtered.to_vec(), expected);
        assert!(filtered.to_vec().iter().all(|&v| v > 5.0));
    }

    #[test]
    fn filter_lt_rechunks_to_full_chunk_invariant() {
        let data: Vec<f64> = (0..1000).map(|i| (i % 7) as f64).collect();
        let col = ChunkedColumn::with_chunk_len(&data, 32);
        let filtered = col.filter_lt(3.0);
        assert_eq!(filtered.chunk_len(), 32);
        let chunk_count = filtered.chunk_count();
        for (i, chunk) in filtered.chunks.iter().enumerate() {
            if i + 1 < chunk_count {
                assert_eq!(chunk.len(), 32);
            }
        }
        assert!(filtered.to_vec().iter().all(|&v| v < 3.0));
    }

    #[test]
    fn argsort_is_stable_and_matches_flat_values_when_gathered() {
        let data: Vec<f64> = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let col = ChunkedColumn::with_chunk_len(&data, 3);
        let perm = col.argsort(true);
        assert_eq!(perm.len(), data.len());
        let mut seen = vec![false; data.len()];
        for &p in &perm {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        let sorted_values: Vec<f64> = perm.iter().map(|&i| data[i as usize]).collect();
        let mut expected = data.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted_values, expected);
    }

    #[test]
    fn sort_reproduces_gather_of_argsort() {
        let data: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64).collect();
        let col = ChunkedColumn::with_chunk_len(&data, 16);
        let sorted = col.sort(true);
        let mut expected = data.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted.to_vec(), expected);
    }

    #[test]
    fn empty_column_aggregates_to_documented_defaults() {
        let col = ChunkedColumn::with_chunk_len(&[], 16);
        assert_eq!(col.sum(), 0.0);
        assert_eq!(col.min(), None);
        assert_eq!(col.max(), None);
        assert_eq!(col.mean(), None);
        assert_eq!(col.argsort(true), Vec::<i32>::new());
    }
}
