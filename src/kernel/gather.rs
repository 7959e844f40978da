//! Gather kernel: `out[i] = src[indices[i]]`, with a type-specific sentinel
//! for out-of-range indices. The negative-index sentinel is what lets
//! left-outer join fill unmatched right-side rows without a branch in the
//! caller.

use crate::element::Numeric;

/// Gathers `src` by `indices` into `out`. `indices[i] < 0` (or `>= src.len()`)
/// yields `T::gather_sentinel()` at position `i` rather than panicking.
pub fn gather<T: Numeric>(src: &[T], indices: &[i32], out: &mut [T]) {
    debug_assert_eq!(indices.len(), out.len());
    for (dst, &idx) in out.iter_mut().zip(indices.iter()) {
        *dst = if idx >= 0 && (idx as usize) < src.len() {
            src[idx as usize]
        } else {
            T::gather_sentinel()
        };
    }
}

/// Allocating convenience wrapper over [`gather`].
pub fn gather_to_vec<T: Numeric>(src: &[T], indices: &[i32]) -> Vec<T> {
    let mut out = vec![T::ZERO; indices.len()];
    gather(src, indices, &mut out);
    out
}
