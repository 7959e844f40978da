//! Property-based tests for the crate's quantified invariants: aggregation
//! reordering, filter/mask duality, argsort stability, chunked/flat
//! equivalence, gather-is-argsort's-inverse, hash determinism, join
//! soundness, left-join completeness, group-by identity, and SIMD-level
//! equivalence.

use proptest::prelude::*;
use vaned::column::ChunkedColumn;
use vaned::groupby;
use vaned::join;
use vaned::kernel::{filter, gather, hash, reduce, sort};
use vaned::simd::SimdLevel;

const LEVELS: [SimdLevel; 4] = [
    SimdLevel::Scalar,
    SimdLevel::Vector128,
    SimdLevel::Vector256,
    SimdLevel::Vector512,
];

fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL.prop_filter("finite", |v| v.is_finite() && v.abs() < 1e12)
}

proptest! {
    /// `sum` must agree across every dispatch level, since lane count only
    /// changes how the accumulator is unrolled, not the set of terms added.
    #[test]
    fn simd_levels_agree_on_sum(data in prop::collection::vec(finite_f64(), 0..500)) {
        let results: Vec<f64> = LEVELS.iter().map(|&l| reduce::sum(&data, l)).collect();
        let max_abs = data.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
        let eps = 1e-6 * data.len() as f64 * max_abs;
        for pair in results.windows(2) {
            prop_assert!((pair[0] - pair[1]).abs() <= eps, "{} vs {}", pair[0], pair[1]);
        }
    }

    /// The index-list and byte-mask forms of a threshold filter must agree
    /// as sets, and the index list must stay in ascending order.
    #[test]
    fn filter_mask_duality_holds(data in prop::collection::vec(-1000i64..1000, 0..500), threshold in -1000i64..1000) {
        let (idx_list, count) = filter::filter_gt(&data, threshold);
        let mask = filter::filter_mask_gt(&data, threshold);
        let from_mask = filter::indices_from_mask(&mask);
        prop_assert_eq!(&idx_list, &from_mask);
        prop_assert_eq!(count, idx_list.len());
        prop_assert!(idx_list.windows(2).all(|w| w[0] < w[1]));
    }

    /// `argsort` always returns a permutation of `[0, len)`, and ties keep
    /// their original relative order (stability).
    #[test]
    fn argsort_is_a_stable_permutation(data in prop::collection::vec(-50i64..50, 0..300)) {
        let perm = sort::argsort(&data, true, SimdLevel::Scalar);
        prop_assert_eq!(perm.len(), data.len());
        let mut seen = vec![false; data.len()];
        for &p in &perm {
            prop_assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        // ties (equal keys) must appear in increasing original-index order
        for key in -50..50 {
            let positions: Vec<i32> = perm.iter().copied().filter(|&i| data[i as usize] == key).collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    /// Gathering by the ascending-argsort permutation always produces a
    /// sorted array — gather is argsort's inverse, by construction.
    #[test]
    fn gather_of_argsort_is_sorted(data in prop::collection::vec(finite_f64(), 0..300)) {
        let perm = sort::argsort(&data, true, SimdLevel::Scalar);
        let sorted = gather::gather_to_vec(&data, &perm);
        prop_assert_eq!(sorted.len(), data.len());
        prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    /// `ChunkedColumn::sum` must match a flat-slice `sum` over the same
    /// data, regardless of how the data happens to be split into chunks.
    #[test]
    fn chunked_sum_matches_flat_sum(data in prop::collection::vec(finite_f64(), 0..2000), chunk_len in 1usize..64) {
        let chunked = ChunkedColumn::with_chunk_len(&data, chunk_len);
        let flat = reduce::sum(&data, SimdLevel::Scalar);
        let max_abs = data.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
        let eps = 1e-6 * data.len() as f64 * max_abs;
        prop_assert!((chunked.sum() - flat).abs() <= eps);
        prop_assert_eq!(chunked.to_vec(), data);
    }

    /// Hashing is a pure function of the canonicalised bit pattern: calling
    /// it twice on the same value gives the same hash, and `-0.0`/`0.0`
    /// (which canonicalise to the same bits) hash identically.
    #[test]
    fn hash_is_deterministic_and_zero_signs_collapse(v in finite_f64()) {
        prop_assert_eq!(hash::hash_element(v), hash::hash_element(v));
        prop_assert_eq!(hash::hash_element(0.0_f64), hash::hash_element(-0.0_f64));
    }

    /// Every pair an inner join emits must satisfy `left[l] == right[r]`,
    /// and the match count never exceeds the Cartesian worst case.
    #[test]
    fn inner_join_pairs_are_sound(
        left in prop::collection::vec(0i64..20, 0..150),
        right in prop::collection::vec(0i64..20, 0..150),
    ) {
        let result = join::inner_join(&left, &right, usize::MAX).unwrap();
        prop_assert_eq!(result.left_indices.len(), result.right_indices.len());
        prop_assert_eq!(result.num_matches, result.left_indices.len());
        for (&l, &r) in result.left_indices.iter().zip(result.right_indices.iter()) {
            prop_assert_eq!(left[l as usize], right[r as usize]);
        }
        prop_assert!(result.num_matches <= left.len() * right.len());
    }

    /// Left-outer join is complete: every left row index appears at least
    /// once in the output, matched or not.
    #[test]
    fn left_join_covers_every_left_row(
        left in prop::collection::vec(0i64..20, 0..150),
        right in prop::collection::vec(0i64..20, 0..150),
    ) {
        let result = join::left_join(&left, &right, usize::MAX).unwrap();
        let mut covered = vec![false; left.len()];
        for &l in &result.left_indices {
            covered[l as usize] = true;
        }
        prop_assert!(covered.iter().all(|&c| c));
        for (&l, &r) in result.left_indices.iter().zip(result.right_indices.iter()) {
            if r >= 0 {
                prop_assert_eq!(left[l as usize], right[r as usize]);
            }
        }
    }

    /// Group-by identity: the number of distinct group ids equals the
    /// number of distinct keys, and every row assigned to a group shares
    /// that group's key with every other row in it.
    #[test]
    fn group_by_identity_holds(keys in prop::collection::vec(0i64..30, 0..300)) {
        let hashes = hash::hash_array_to_vec(&keys);
        let (group_ids, num_groups) = groupby::compute_with_keys(&hashes, &keys);

        let distinct: std::collections::HashSet<i64> = keys.iter().copied().collect();
        prop_assert_eq!(num_groups, distinct.len());

        let mut group_key: std::collections::HashMap<u32, i64> = std::collections::HashMap::new();
        for (&gid, &k) in group_ids.iter().zip(keys.iter()) {
            match group_key.get(&gid) {
                Some(&existing) => prop_assert_eq!(existing, k),
                None => { group_key.insert(gid, k); }
            }
        }
    }
}
