//! Hash-join engine: a chained hash table build, plus
//! sequential-build/parallel-probe inner and left-outer join.

use crate::element::Numeric;
use crate::error::{KernelError, Result};
use crate::kernel::hash;
use std::ops::Range;

/// Above this pathological build size the next-power-of-two table length
/// would itself overflow `usize` headroom we're willing to allocate;
/// reported as [`KernelError::JoinTableOverflow`] rather than attempted.
const MAX_BUILD_ROWS: usize = 1 << 61;

/// `head[T]`/`next[N]` chained hash table. A transient allocation tied to
/// one join call — join result handles own only the output index arrays,
/// not this table.
pub struct ChainedHashTable {
    head: Vec<i32>,
    next: Vec<i32>,
    mask: usize,
}

impl ChainedHashTable {
    /// Builds a table over `hashes`: `T = next_pow2(max(N*2, 16))`,
    /// insertion in index order so chains are deterministic and duplicate
    /// keys are preserved as independent chain entries.
    pub fn build(hashes: &[u64]) -> Result<Self> {
        let n = hashes.len();
        if n > MAX_BUILD_ROWS {
            return Err(KernelError::JoinTableOverflow { n });
        }
        let t = n.saturating_mul(2).max(16).next_power_of_two();

        let mut head = vec![-1i32; t];
        let mut next = vec![-1i32; n];
        let mask = t - 1;
        for (i, &h) in hashes.iter().enumerate() {
            let b = (h as usize) & mask;
            next[i] = head[b];
            head[b] = i as i32;
        }
        tracing::debug!(rows = n, table_len = t, "join: built chained hash table");
        Ok(Self { head, next, mask })
    }

    /// Table length `T` (a power of two).
    pub fn table_len(&self) -> usize {
        self.head.len()
    }

    /// Walks the chain for `hash`'s bucket, most-recently-inserted first.
    pub fn chain(&self, hash: u64) -> ChainIter<'_> {
        let b = (hash as usize) & self.mask;
        ChainIter {
            next: &self.next,
            cur: self.head[b],
        }
    }
}

pub struct ChainIter<'a> {
    next: &'a [i32],
    cur: i32,
}

impl Iterator for ChainIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cur < 0 {
            return None;
        }
        let idx = self.cur as usize;
        self.cur = self.next[idx];
        Some(idx)
    }
}

/// `(left_indices, right_indices)` materialised by [`inner_join`].
#[derive(Debug, Clone, Default)]
pub struct InnerJoinResult {
    pub num_matches: usize,
    pub left_indices: Vec<i32>,
    pub right_indices: Vec<i32>,
}

/// `(left_indices, right_indices)` materialised by [`left_join`]; unmatched
/// left rows carry `right_index == -1`.
#[derive(Debug, Clone, Default)]
pub struct LeftJoinResult {
    pub num_matches: usize,
    pub left_indices: Vec<i32>,
    pub right_indices: Vec<i32>,
}

fn truncate_pair(a: &mut Vec<i32>, b: &mut Vec<i32>, max_matches: usize) {
    if a.len() > max_matches {
        a.truncate(max_matches);
        b.truncate(max_matches);
    }
}

/// Emits every `(p, c)` pair for probe rows in `range` where
/// `build_keys[c] == probe_keys[p]` (inner-join semantics: unmatched probe
/// rows emit nothing).
fn probe_range_inner<K: Numeric>(
    table: &ChainedHashTable,
    build_keys: &[K],
    probe_keys: &[K],
    probe_hashes: &[u64],
    range: Range<usize>,
    p_out: &mut Vec<i32>,
    c_out: &mut Vec<i32>,
) {
    for p in range {
        for c in table.chain(probe_hashes[p]) {
            if build_keys[c] == probe_keys[p] {
                p_out.push(p as i32);
                c_out.push(c as i32);
            }
        }
    }
}

/// As [`probe_range_inner`], but an unmatched probe (left) row emits
/// `(p, -1)` instead of nothing (left-outer semantics).
fn probe_range_left<K: Numeric>(
    table: &ChainedHashTable,
    build_keys: &[K],
    probe_keys: &[K],
    probe_hashes: &[u64],
    range: Range<usize>,
    p_out: &mut Vec<i32>,
    c_out: &mut Vec<i32>,
) {
    for p in range {
        let mut matched = false;
        for c in table.chain(probe_hashes[p]) {
            if build_keys[c] == probe_keys[p] {
                p_out.push(p as i32);
                c_out.push(c as i32);
                matched = true;
            }
        }
        if !matched {
            p_out.push(p as i32);
            c_out.push(-1);
        }
    }
}

struct SendPairPtr<T>(*mut T);
unsafe impl<T: Send> Send for SendPairPtr<T> {}
unsafe impl<T: Send> Sync for SendPairPtr<T> {}

/// Partitions `0..n` probe rows across Blitz, runs `probe_range` over each
/// partition into a local buffer pair, then concatenates in partition
/// order — this is what gives left-outer join its documented global
/// left-row-order guarantee, independent of which task actually finishes
/// first.
fn parallel_probe<K, F>(
    n: usize,
    table: &ChainedHashTable,
    build_keys: &[K],
    probe_keys: &[K],
    probe_hashes: &[u64],
    max_matches: usize,
    probe_range: F,
) -> (Vec<i32>, Vec<i32>)
where
    K: Numeric,
    F: Fn(&ChainedHashTable, &[K], &[K], &[u64], Range<usize>, &mut Vec<i32>, &mut Vec<i32>) + Sync,
{
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    if n < crate::config::parallel_threshold() {
        let mut p_out = Vec::new();
        let mut c_out = Vec::new();
        probe_range(table, build_keys, probe_keys, probe_hashes, 0..n, &mut p_out, &mut c_out);
        truncate_pair(&mut p_out, &mut c_out, max_matches);
        return (p_out, c_out);
    }

    let chunk_len = crate::config::group_size().max(1);
    let n_chunks = n.div_ceil(chunk_len);
    let mut partials: Vec<(Vec<i32>, Vec<i32>)> = (0..n_chunks).map(|_| (Vec::new(), Vec::new())).collect();
    let partials_ptr = SendPairPtr(partials.as_mut_ptr());

    crate::blitz::driver::parallel_for(n, chunk_len, move |range| {
        let chunk = range.start / chunk_len;
        let mut p_local = Vec::new();
        let mut c_local = Vec::new();
        probe_range(table, build_keys, probe_keys, probe_hashes, range, &mut p_local, &mut c_local);
        // SAFETY: each chunk index is assigned to exactly one task.
        unsafe {
            *partials_ptr.0.add(chunk) = (p_local, c_local);
        }
    });

    let mut p_out = Vec::new();
    let mut c_out = Vec::new();
    for (p, c) in partials {
        p_out.extend(p);
        c_out.extend(c);
    }
    truncate_pair(&mut p_out, &mut c_out, max_matches);
    (p_out, c_out)
}

/// Inner join on `(left, right)`, building on whichever side is smaller at
/// call time.
pub fn inner_join<K: Numeric>(left: &[K], right: &[K], max_matches: usize) -> Result<InnerJoinResult> {
    let build_is_left = left.len() <= right.len();
    let (build_keys, probe_keys) = if build_is_left { (left, right) } else { (right, left) };

    let build_hashes = hash::hash_array_to_vec(build_keys);
    let table = ChainedHashTable::build(&build_hashes)?;
    let probe_hashes = hash::hash_array_to_vec(probe_keys);

    let (p_idx, c_idx) = parallel_probe(
        probe_keys.len(),
        &table,
        build_keys,
        probe_keys,
        &probe_hashes,
        max_matches,
        probe_range_inner,
    );

    let (left_indices, right_indices) = if build_is_left { (c_idx, p_idx) } else { (p_idx, c_idx) };
    tracing::debug!(matches = left_indices.len(), "join: inner join complete");
    Ok(InnerJoinResult {
        num_matches: left_indices.len(),
        left_indices,
        right_indices,
    })
}

/// Left-outer join on `(left, right)`, always building on the right.
/// Unmatched left rows appear once with `right_index == -1`.
pub fn left_join<K: Numeric>(left: &[K], right: &[K], max_matches: usize) -> Result<LeftJoinResult> {
    let build_hashes = hash::hash_array_to_vec(right);
    let table = ChainedHashTable::build(&build_hashes)?;
    let probe_hashes = hash::hash_array_to_vec(left);

    let (left_indices, right_indices) = parallel_probe(
        left.len(),
        &table,
        right,
        left,
        &probe_hashes,
        max_matches,
        probe_range_left,
    );

    tracing::debug!(rows = left_indices.len(), "join: left join complete");
    Ok(LeftJoinResult {
        num_matches: left_indices.len(),
        left_indices,
        right_indices,
    })
}
