//! Argsort kernel: a stable key sort whose output is a permutation of
//! `[0, len)`, ties broken by original index.
//!
//! Dispatch level is accepted for interface symmetry with the rest of the
//! registry (every other op resolves a `(operation, type)` pair to a
//! vectorized body), but a comparison sort has no meaningful "vector body"
//! the way a reduction or elementwise op does — the SIMD level does not
//! change the result, only (in principle) low-level comparison throughput.

use crate::element::Numeric;
use crate::simd::SimdLevel;
use std::cmp::Ordering;

#[inline]
fn total_cmp<T: Numeric>(a: T, b: T) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Returns a permutation of `[0, data.len())` that orders `data`
/// ascending (or descending), stable: equal keys keep their relative
/// original order.
pub fn argsort<T: Numeric>(data: &[T], ascending: bool, _level: SimdLevel) -> Vec<i32> {
    let mut idx: Vec<i32> = (0..data.len() as i32).collect();
    idx.sort_by(|&a, &b| {
        let ord = total_cmp(data[a as usize], data[b as usize]);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    idx
}

/// `sort(data)`: equivalent to `gather(data, argsort(data, ascending))`.
pub fn sort<T: Numeric>(data: &[T], ascending: bool, level: SimdLevel) -> Vec<T> {
    let perm = argsort(data, ascending, level);
    crate::kernel::gather::gather_to_vec(data, &perm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_3_argsort_stability() {
        let data = [2.0, 1.0, 2.0, 1.0];
        let perm = argsort(&data, true, SimdLevel::Scalar);
        assert_eq!(perm, vec![1, 3, 0, 2]);
    }

    #[test]
    fn ties_are_strictly_increasing_in_original_index() {
        let data = [5, 5, 5, 1, 5];
        let perm = argsort(&data, true, SimdLevel::Scalar);
        // indices of equal keys (all the 5s) must appear in increasing order
        let fives: Vec<i32> = perm.iter().copied().filter(|&i| data[i as usize] == 5).collect();
        assert!(fives.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn descending_reverses_values_but_not_ties() {
        let data = [3.0, 1.0, 3.0, 2.0];
        let perm = argsort(&data, false, SimdLevel::Scalar);
        let sorted: Vec<f64> = perm.iter().map(|&i| data[i as usize]).collect();
        assert_eq!(sorted, vec![3.0, 3.0, 2.0, 1.0]);
        assert_eq!(perm[0], 0);
        assert_eq!(perm[1], 2);
    }

    #[test]
    fn sort_matches_gather_of_argsort() {
        let data = [4.0, 2.0, 9.0, 1.0];
        let sorted = sort(&data, true, SimdLevel::Scalar);
        assert_eq!(sorted, vec![1.0, 2.0, 4.0, 9.0]);
    }

    #[test]
    fn nan_sorts_last_ascending() {
        let data = [3.0, f64::NAN, 1.0];
        let perm = argsort(&data, true, SimdLevel::Scalar);
        assert_eq!(perm[2], 1);
    }

    #[test]
    fn permutation_covers_every_index_exactly_once() {
        let data: Vec<i64> = (0..50).map(|i| (i * 31) % 17).collect();
        let perm = argsort(&data, true, SimdLevel::Scalar);
        let mut seen = vec![false; data.len()];
        for &p in &perm {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }
}
