//! Group-by engine: dense group-id assignment from a hash stream via
//! open-addressed linear probing, extended with first-row and per-group
//! counts, and per-group aggregation.

use crate::element::Numeric;
use crate::kernel::hash;
use crate::kernel::reduce::{combine_max, combine_min};

struct SendConstPtr<T>(*const T);
unsafe impl<T: Sync> Send for SendConstPtr<T> {}
unsafe impl<T: Sync> Sync for SendConstPtr<T> {}

struct SendMutPtr<T>(*mut T);
unsafe impl<T: Send> Send for SendMutPtr<T> {}
unsafe impl<T: Send> Sync for SendMutPtr<T> {}

fn table_capacity(len: usize) -> usize {
    len.saturating_mul(2).max(16).next_power_of_two()
}

/// Assigns a dense `[0, G)` group id per row from `hashes` alone. Hash
/// collisions between genuinely different keys silently merge groups —
/// documented, not fixed; callers that need correctness should use
/// [`compute_with_keys`].
pub fn compute(hashes: &[u64]) -> (Vec<u32>, usize) {
    let len = hashes.len();
    let capacity = table_capacity(len);
    let mask = capacity - 1;
    let mut slot_used = vec![false; capacity];
    let mut slot_hash = vec![0u64; capacity];
    let mut slot_group = vec![0u32; capacity];
    let mut group_ids = vec![0u32; len];
    let mut next_group: u32 = 0;

    for (row, &h) in hashes.iter().enumerate() {
        let mut idx = (h as usize) & mask;
        loop {
            if !slot_used[idx] {
                slot_used[idx] = true;
                slot_hash[idx] = h;
                slot_group[idx] = next_group;
                group_ids[row] = next_group;
                next_group += 1;
                break;
            }
            if slot_hash[idx] == h {
                group_ids[row] = slot_group[idx];
                break;
            }
            idx = (idx + 1) & mask;
        }
    }
    tracing::debug!(rows = len, groups = next_group, "groupby: compute (no keys)");
    (group_ids, next_group as usize)
}

/// As [`compute`], but disambiguates hash collisions by comparing the
/// row's key against the canonical key stored for the slot's group,
/// continuing the probe on a mismatch.
pub fn compute_with_keys<K: Numeric>(hashes: &[u64], keys: &[K]) -> (Vec<u32>, usize) {
    let len = hashes.len();
    debug_assert_eq!(hashes.len(), keys.len());
    let capacity = table_capacity(len);
    let mask = capacity - 1;
    let mut slot_used = vec![false; capacity];
    let mut slot_hash = vec![0u64; capacity];
    let mut slot_key: Vec<K> = vec![K::ZERO; capacity];
    let mut slot_group = vec![0u32; capacity];
    let mut group_ids = vec![0u32; len];
    let mut next_group: u32 = 0;

    for row in 0..len {
        let h = hashes[row];
        let k = keys[row];
        let mut idx = (h as usize) & mask;
        loop {
            if !slot_used[idx] {
                slot_used[idx] = true;
                slot_hash[idx] = h;
                slot_key[idx] = k;
                slot_group[idx] = next_group;
                group_ids[row] = next_group;
                next_group += 1;
                break;
            }
            if slot_hash[idx] == h && slot_key[idx] == k {
                group_ids[row] = slot_group[idx];
                break;
            }
            idx = (idx + 1) & mask;
        }
    }
    tracing::debug!(rows = len, groups = next_group, "groupby: compute_with_keys");
    (group_ids, next_group as usize)
}

/// Extended group-by result: group ids plus first-seen row and per-group
/// row count.
#[derive(Debug, Clone, Default)]
pub struct GroupByExtResult {
    pub group_ids: Vec<u32>,
    pub first_row_idx: Vec<u32>,
    pub group_counts: Vec<u32>,
}

fn extend(group_ids: Vec<u32>, num_groups: usize) -> GroupByExtResult {
    let mut first_row_idx = vec![u32::MAX; num_groups];
    let mut group_counts = vec![0u32; num_groups];
    for (row, &gid) in group_ids.iter().enumerate() {
        let gi = gid as usize;
        if first_row_idx[gi] == u32::MAX {
            first_row_idx[gi] = row as u32;
        }
        group_counts[gi] += 1;
    }
    GroupByExtResult {
        group_ids,
        first_row_idx,
        group_counts,
    }
}

/// [`compute`] plus `first_row_idx`/`group_counts`.
pub fn compute_ext(hashes: &[u64]) -> GroupByExtResult {
    let (group_ids, num_groups) = compute(hashes);
    extend(group_ids, num_groups)
}

/// [`compute_with_keys`] plus `first_row_idx`/`group_counts`.
pub fn compute_ext_with_keys<K: Numeric>(hashes: &[u64], keys: &[K]) -> GroupByExtResult {
    let (group_ids, num_groups) = compute_with_keys(hashes, keys);
    extend(group_ids, num_groups)
}

/// Chunk-parallel per-group reduction: each task owns a private
/// length-`num_groups` accumulator array, scanned rows fold into it, and
/// the per-task arrays are reduced pairwise at the end — correct because
/// every op here is associative per group.
fn parallel_group_reduce<Acc, Fold, Combine>(
    group_ids: &[u32],
    num_groups: usize,
    identity: Acc,
    fold_row: Fold,
    combine: Combine,
) -> Vec<Acc>
where
    Acc: Copy + Send,
    Fold: Fn(&mut [Acc], usize, usize) + Sync,
    Combine: Fn(Acc, Acc) -> Acc,
{
    let len = group_ids.len();
    if num_groups == 0 {
        return Vec::new();
    }
    if len < crate::config::parallel_threshold() {
        let mut acc = vec![identity; num_groups];
        for row in 0..len {
            fold_row(&mut acc, row, group_ids[row] as usize);
        }
        return acc;
    }

    let chunk_len = crate::config::group_size().max(1);
    let n_chunks = len.div_ceil(chunk_len);
    let mut partials: Vec<Vec<Acc>> = (0..n_chunks).map(|_| vec![identity; num_groups]).collect();
    let partials_ptr = SendMutPtr(partials.as_mut_ptr());
    let gids_ptr = SendConstPtr(group_ids.as_ptr());

    crate::blitz::driver::parallel_for(len, chunk_len, move |range| {
        let chunk = range.start / chunk_len;
        // SAFETY: each chunk index is assigned to exactly one task, so the
        // `&mut` borrow below never aliases another task's.
        let local = unsafe { &mut *partials_ptr.0.add(chunk) };
        for row in range {
            let gid = unsafe { *gids_ptr.0.add(row) } as usize;
            fold_row(local, row, gid);
        }
    });

    let mut total = vec![identity; num_groups];
    for partial in partials {
        for g in 0..num_groups {
            total[g] = combine(total[g], partial[g]);
        }
    }
    total
}

/// Per-group sum of `values`, indexed by `group_ids`.
pub fn sum_by_group(group_ids: &[u32], values: &[f64], num_groups: usize) -> Vec<f64> {
    parallel_group_reduce(
        group_ids,
        num_groups,
        0.0f64,
        move |acc, row, gid| acc[gid] += values[row],
        |a, b| a + b,
    )
}

/// Per-group row count.
pub fn count_by_group(group_ids: &[u32], num_groups: usize) -> Vec<u32> {
    parallel_group_reduce(group_ids, num_groups, 0u32, |acc, _row, gid| acc[gid] += 1, |a, b| a + b)
}

/// Per-group minimum, NaN-ignoring pairwise like [`crate::kernel::reduce::min`];
/// `None` at an index is impossible for a group that actually occurs in
/// `group_ids` (every group owns at least one row by construction).
pub fn min_by_group(group_ids: &[u32], values: &[f64], num_groups: usize) -> Vec<Option<f64>> {
    parallel_group_reduce(
        group_ids,
        num_groups,
        None,
        move |acc, row, gid| {
            let v = values[row];
            acc[gid] = Some(match acc[gid] {
                None => v,
                Some(prev) => combine_min(prev, v),
            });
        },
        |a, b| match (a, b) {
            (None, x) | (x, None) => x,
            (Some(x), Some(y)) => Some(combine_min(x, y)),
        },
    )
}

/// Per-group maximum; see [`min_by_group`].
pub fn max_by_group(group_ids: &[u32], values: &[f64], num_groups: usize) -> Vec<Option<f64>> {
    parallel_group_reduce(
        group_ids,
        num_groups,
        None,
        move |acc, row, gid| {
            let v = values[row];
            acc[gid] = Some(match acc[gid] {
                None => v,
                Some(prev) => combine_max(prev, v),
            });
        },
        |a, b| match (a, b) {
            (None, x) | (x, None) => x,
            (Some(x), Some(y)) => Some(combine_max(x, y)),
        },
    )
}

/// `{sum, min, max, count}` per group, folded in a single scan per row.
#[derive(Debug, Clone)]
pub struct MultiAgg {
    pub sum: Vec<f64>,
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
    pub count: Vec<u32>,
}

#[derive(Clone, Copy)]
struct MultiAccum {
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    count: u32,
}

const MULTI_IDENTITY: MultiAccum = MultiAccum {
    sum: 0.0,
    min: None,
    max: None,
    count: 0,
};

fn combine_multi(a: MultiAccum, b: MultiAccum) -> MultiAccum {
    MultiAccum {
        sum: a.sum + b.sum,
        min: match (a.min, b.min) {
            (None, x) | (x, None) => x,
            (Some(x), Some(y)) => Some(combine_min(x, y)),
        },
        max: match (a.max, b.max) {
            (None, x) | (x, None) => x,
            (Some(x), Some(y)) => Some(combine_max(x, y)),
        },
        count: a.count + b.count,
    }
}

pub fn multi_agg_by_group(group_ids: &[u32], values: &[f64], num_groups: usize) -> MultiAgg {
    let accs = parallel_group_reduce(
        group_ids,
        num_groups,
        MULTI_IDENTITY,
        move |acc, row, gid| {
            let v = values[row];
            let a = &mut acc[gid];
            a.sum += v;
            a.min = Some(match a.min {
                None => v,
                Some(prev) => combine_min(prev, v),
            });
            a.max = Some(match a.max {
                None => v,
                Some(prev) => combine_max(prev, v),
            });
            a.count += 1;
        },
        combine_multi,
    );

    MultiAgg {
        sum: accs.iter().map(|a| a.sum).collect(),
        min: accs.iter().map(|a| a.min).collect(),
        max: accs.iter().map(|a| a.max).collect(),
        count: accs.iter().map(|a| a.count).collect(),
    }
}

/// End-to-end grouped sum: hash `keys`, run [`compute_ext_with_keys`],
/// gather the distinct group keys via `first_row_idx`, sum `values` per
/// group. Group order is id order, which is first-seen order.
#[derive(Debug, Clone)]
pub struct GroupBySumResult<K> {
    pub keys: Vec<K>,
    pub sums: Vec<f64>,
    pub counts: Vec<u32>,
    pub first_row_idx: Vec<u32>,
}

pub fn group_by_sum<K: Numeric>(keys: &[K], values: &[f64]) -> GroupBySumResult<K> {
    let hashes = hash::hash_array_to_vec(keys);
    let ext = compute_ext_with_keys(&hashes, keys);
    let num_groups = ext.first_row_idx.len();
    let sums = sum_by_group(&ext.group_ids, values, num_groups);
    let group_keys: Vec<K> = ext.first_row_idx.iter().map(|&r| keys[r as usize]).collect();
    tracing::debug!(groups = num_groups, "groupby: end-to-end sum complete");
    GroupBySumResult {
        keys: group_keys,
        sums,
        counts: ext.group_counts,
        first_row_idx: ext.first_row_idx,
    }
}

/// As [`group_by_sum`], but folding `{sum, min, max, count}` together.
#[derive(Debug, Clone)]
pub struct GroupByMultiAggResult<K> {
    pub keys: Vec<K>,
    pub aggregates: MultiAgg,
    pub first_row_idx: Vec<u32>,
}

pub fn group_by_multi_agg<K: Numeric>(keys: &[K], values: &[f64]) -> GroupByMultiAggResult<K> {
    let hashes = hash::hash_array_to_vec(keys);
    let ext = compute_ext_with_keys(&hashes, keys);
    let num_groups = ext.first_row_idx.len();
    let aggregates = multi_agg_by_group(&ext.group_ids, values, num_groups);
    let group_keys: Vec<K> = ext.first_row_idx.iter().map(|&r| keys[r as usize]).collect();
    GroupByMultiAggResult {
        keys: group_keys,
        aggregates,
        first_row_idx: ext.first_row_idx,
    }
}
