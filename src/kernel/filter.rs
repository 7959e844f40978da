//! Filter kernels: threshold comparison producing either a packed index
//! list with its count, or a dense byte mask.
//!
//! `filter_mask_*` and `filter_*` (indices) are defined to agree as sets and
//! in ascending order — both walk the input in the same order and apply
//! the same comparison.

use crate::element::Numeric;
use crate::kernel::elementwise::{apply_cmp, CompareOp};

fn filter_mask<T: Numeric>(data: &[T], threshold: T, op: CompareOp) -> Vec<u8> {
    let mut mask = vec![0u8; data.len()];
    crate::kernel::elementwise::compare_scalar(data, threshold, op, &mut mask);
    mask
}

/// Dense byte mask for `data[i] > threshold`.
pub fn filter_mask_gt<T: Numeric>(data: &[T], threshold: T) -> Vec<u8> {
    filter_mask(data, threshold, CompareOp::Gt)
}

/// Dense byte mask for `data[i] < threshold`.
pub fn filter_mask_lt<T: Numeric>(data: &[T], threshold: T) -> Vec<u8> {
    filter_mask(data, threshold, CompareOp::Lt)
}

/// Dense byte mask for `data[i] >= threshold`.
pub fn filter_mask_ge<T: Numeric>(data: &[T], threshold: T) -> Vec<u8> {
    filter_mask(data, threshold, CompareOp::Ge)
}

/// Dense byte mask for `data[i] <= threshold`.
pub fn filter_mask_le<T: Numeric>(data: &[T], threshold: T) -> Vec<u8> {
    filter_mask(data, threshold, CompareOp::Le)
}

/// Converts a dense mask into an ascending packed index list, matching
/// the index-list form of `filter_*`.
pub fn indices_from_mask(mask: &[u8]) -> Vec<i32> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &m)| (m != 0).then_some(i as i32))
        .collect()
}

fn filter_indices<T: Numeric>(data: &[T], threshold: T, op: CompareOp) -> (Vec<i32>, usize) {
    // Two-pass: count first so the output buffer is allocated at its exact
    // final size (no growth reallocation), matching the parallel driver's
    // count-then-compact discipline.
    let mut count = 0usize;
    for &v in data {
        if apply_cmp(op, v, threshold) {
            count += 1;
        }
    }
    let mut indices = Vec::with_capacity(count);
    for (i, &v) in data.iter().enumerate() {
        if apply_cmp(op, v, threshold) {
            indices.push(i as i32);
        }
    }
    let n = indices.len();
    (indices, n)
}

/// Ascending indices `i` where `data[i] > threshold`, and their count.
pub fn filter_gt<T: Numeric>(data: &[T], threshold: T) -> (Vec<i32>, usize) {
    filter_indices(data, threshold, CompareOp::Gt)
}

/// Ascending indices `i` where `data[i] < threshold`, and their count.
pub fn filter_lt<T: Numeric>(data: &[T], threshold: T) -> (Vec<i32>, usize) {
    filter_indices(data, threshold, CompareOp::Lt)
}

/// Ascending indices `i` where `data[i] >= threshold`, and their count.
pub fn filter_ge<T: Numeric>(data: &[T], threshold: T) -> (Vec<i32>, usize) {
    filter_indices(data, threshold, CompareOp::Ge)
}

/// Ascending indices `i` where `data[i] <= threshold`, and their count.
pub fn filter_le<T: Numeric>(data: &[T], threshold: T) -> (Vec<i32>, usize) {
    filter_indices(data, threshold, CompareOp::Le)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_2_filter() {
        let data = [5, 1, 7, 3, 9];
        let (indices, count) = filter_gt(&data, 3);
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(count, 3);
        let mask = filter_mask_gt(&data, 3);
        assert_eq!(mask, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn filter_and_mask_duality_holds_as_sets_and_order() {
        let data: Vec<i64> = (0..200).map(|i| (i * 7) % 53).collect();
        let threshold = 25;
        let (idx_list, count) = filter_gt(&data, threshold);
        let mask = filter_mask_gt(&data, threshold);
        let from_mask = indices_from_mask(&mask);
        assert_eq!(idx_list, from_mask);
        assert_eq!(count, idx_list.len());
        assert!(idx_list.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_input_filters_to_empty() {
        let data: [f64; 0] = [];
        let (indices, count) = filter_gt(&data, 0.0);
        assert!(indices.is_empty());
        assert_eq!(count, 0);
    }
}
