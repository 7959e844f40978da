//! Reduction kernels: sum, min, max, mean.
//!
//! Associativity is relied on for reordering, which is what makes these
//! parallelisable across chunks/tasks. NaN propagation:
//! sum/mean follow "any NaN input ⇒ NaN output"; min/max ignore NaN
//! operands pairwise, returning NaN only when every input is NaN.

use crate::element::Numeric;
use crate::kernel::{effective_lanes, MAX_LANES};
use crate::simd::SimdLevel;

/// Vector-body-then-scalar-tail reduction core, shared by sum/min/max.
///
/// Uses `lanes` independent accumulators so the dependency chain between
/// consecutive elements is broken: each accumulator only depends on its
/// own previous value, letting the CPU retire several in flight per cycle
/// instead of waiting on one serial chain.
fn reduce_unrolled<T, F>(data: &[T], lanes: usize, combine: F) -> Option<T>
where
    T: Numeric,
    F: Fn(T, T) -> T,
{
    let len = data.len();
    if len == 0 {
        return None;
    }
    if len < lanes {
        let mut acc = data[0];
        for &v in &data[1..] {
            acc = combine(acc, v);
        }
        return Some(acc);
    }

    let mut acc = [T::ZERO; MAX_LANES];
    // SAFETY: `lanes <= len` was just checked, and `lanes <= MAX_LANES` is
    // an invariant of `effective_lanes`.
    unsafe {
        for l in 0..lanes {
            acc[l] = *data.get_unchecked(l);
        }
    }

    let chunks = len / lanes;
    unsafe {
        for i in 1..chunks {
            let base = i * lanes;
            for l in 0..lanes {
                let v = *data.get_unchecked(base + l);
                acc[l] = combine(acc[l], v);
            }
        }
    }

    let mut result = acc[0];
    for item in acc.iter().take(lanes).skip(1) {
        result = combine(result, *item);
    }
    for &v in &data[chunks * lanes..] {
        result = combine(result, v);
    }
    Some(result)
}

/// NaN-ignoring pairwise minimum: the combiner chunked/parallel callers
/// reduce partial chunk results with, so a chunk that is all-NaN doesn't
/// poison a sibling chunk's real minimum.
#[inline]
pub(crate) fn combine_min<T: Numeric>(a: T, b: T) -> T {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else if b < a {
        b
    } else {
        a
    }
}

/// NaN-ignoring pairwise maximum; see [`combine_min`].
#[inline]
pub(crate) fn combine_max<T: Numeric>(a: T, b: T) -> T {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else if b > a {
        b
    } else {
        a
    }
}

/// `sum(data)`. Empty input sums to `T::ZERO`, not `None` — sum is total,
/// unlike min/max/mean.
pub fn sum<T: Numeric>(data: &[T], level: SimdLevel) -> T {
    if data.is_empty() {
        return T::ZERO;
    }
    let lanes = effective_lanes::<T>(level);
    reduce_unrolled(data, lanes, Numeric::add).expect("non-empty checked above")
}

/// `min(data)`, ignoring NaN operands pairwise; `None` for empty input.
pub fn min<T: Numeric>(data: &[T], level: SimdLevel) -> Option<T> {
    let lanes = effective_lanes::<T>(level);
    reduce_unrolled(data, lanes, combine_min)
}

/// `max(data)`, ignoring NaN operands pairwise; `None` for empty input.
pub fn max<T: Numeric>(data: &[T], level: SimdLevel) -> Option<T> {
    let lanes = effective_lanes::<T>(level);
    reduce_unrolled(data, lanes, combine_max)
}

/// `mean(data)` as `f64` regardless of input width; `None` for empty input.
/// NaN propagates through `sum`, so a mean over any-NaN input is NaN too.
pub fn mean<T: Numeric>(data: &[T], level: SimdLevel) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(sum(data, level).to_f64() / data.len() as f64)
}
