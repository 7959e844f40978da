//! Windowing/cumulative kernels: running (cumulative) reductions and
//! fixed-width moving sums. These are sequential-by-nature (each output
//! depends on the one before it, or on a sliding span), so unlike
//! `reduce`/`elementwise` they are not dispatched through the parallel
//! driver — the dependency chain between adjacent outputs rules that out.

use crate::element::Numeric;

/// Running sum: `out[i] = sum(data[0..=i])`.
pub fn cumulative_sum<T: Numeric>(data: &[T], out: &mut [T]) {
    debug_assert_eq!(data.len(), out.len());
    let mut acc = T::ZERO;
    for (dst, &v) in out.iter_mut().zip(data.iter()) {
        acc = acc.add(v);
        *dst = acc;
    }
}

/// Running minimum, NaN-ignoring like [`crate::kernel::reduce::min`]:
/// `out[i] = min(data[0..=i])` with NaN operands skipped pairwise.
pub fn cumulative_min<T: Numeric>(data: &[T], out: &mut [T]) {
    debug_assert_eq!(data.len(), out.len());
    if data.is_empty() {
        return;
    }
    let mut acc = data[0];
    out[0] = acc;
    for i in 1..data.len() {
        acc = crate::kernel::reduce::combine_min(acc, data[i]);
        out[i] = acc;
    }
}

/// Running maximum; see [`cumulative_min`].
pub fn cumulative_max<T: Numeric>(data: &[T], out: &mut [T]) {
    debug_assert_eq!(data.len(), out.len());
    if data.is_empty() {
        return;
    }
    let mut acc = data[0];
    out[0] = acc;
    for i in 1..data.len() {
        acc = crate::kernel::reduce::combine_max(acc, data[i]);
        out[i] = acc;
    }
}

/// Fixed-width trailing moving sum: `out[i] = sum(data[max(0, i-w+1)..=i])`.
/// Implemented as a running total with a subtracted trailing edge rather
/// than summing each window from scratch, so cost is `O(n)` total, not
/// `O(n * window)`.
pub fn moving_sum<T: Numeric>(data: &[T], window: usize, out: &mut [T]) {
    debug_assert_eq!(data.len(), out.len());
    debug_assert!(window > 0);
    let mut acc = T::ZERO;
    for i in 0..data.len() {
        acc = acc.add(data[i]);
        if i >= window {
            acc = acc.sub(data[i - window]);
        }
        out[i] = acc;
    }
}
