//! Horizontal folds: element-wise reduction *across* several equal-length
//! columns, producing one output column — the row-wise counterpart to
//! `reduce`'s column-wise (vertical) aggregation. E.g. the row-max of three
//! price columns, rather than the max of one column's values.

use crate::element::Numeric;
use crate::kernel::reduce::{combine_max, combine_min};

fn horizontal_fold<T: Numeric>(columns: &[&[T]], out: &mut [T], identity: T, combine: impl Fn(T, T) -> T) {
    debug_assert!(!columns.is_empty());
    let len = out.len();
    for col in columns {
        debug_assert_eq!(col.len(), len);
    }
    for dst in out.iter_mut() {
        *dst = identity;
    }
    for col in columns {
        for (dst, &v) in out.iter_mut().zip(col.iter()) {
            *dst = combine(*dst, v);
        }
    }
}

/// Row-wise sum across `columns` into `out`.
pub fn horizontal_sum<T: Numeric>(columns: &[&[T]], out: &mut [T]) {
    horizontal_fold(columns, out, T::ZERO, Numeric::add);
}

/// Row-wise minimum across `columns`, NaN-ignoring per row like
/// [`crate::kernel::reduce::min`].
pub fn horizontal_min<T: Numeric>(columns: &[&[T]], out: &mut [T]) {
    debug_assert!(!columns.is_empty());
    out.copy_from_slice(columns[0]);
    for col in &columns[1..] {
        for (dst, &v) in out.iter_mut().zip(col.iter()) {
            *dst = combine_min(*dst, v);
        }
    }
}

/// Row-wise maximum across `columns`; see [`horizontal_min`].
pub fn horizontal_max<T: Numeric>(columns: &[&[T]], out: &mut [T]) {
    debug_assert!(!columns.is_empty());
    out.copy_from_slice(columns[0]);
    for col in &columns[1..] {
        for (dst, &v) in out.iter_mut().zip(col.iter()) {
            *dst = combine_max(*dst, v);
        }
    }
}
