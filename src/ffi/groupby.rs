//! FFI over the group-by engine, keyed on `i64` (see `ffi::join`'s note on
//! type-narrowed families).

use super::guard;
use crate::groupby;
use std::slice;

/// Computes the grouped sum of `values` by `keys`, writing the distinct
/// group keys (first-seen order), sums, and per-group counts into
/// freshly allocated buffers of `*out_groups` entries each. Reclaim with
/// [`vaned_i64_groupby_sum_destroy`].
///
/// # Safety
/// `keys`/`values` valid for `len` reads each; the four `out_*` pointers
/// valid for one write each.
#[no_mangle]
pub unsafe extern "C" fn vaned_i64_groupby_sum(
    keys: *const i64,
    values: *const f64,
    len: usize,
    out_keys: *mut *mut i64,
    out_sums: *mut *mut f64,
    out_counts: *mut *mut u32,
    out_groups: *mut usize,
) -> i32 {
    guard(|| {
        let keys_slice = slice::from_raw_parts(keys, len);
        let values_slice = slice::from_raw_parts(values, len);
        let mut result = groupby::group_by_sum(keys_slice, values_slice);

        result.keys.shrink_to_fit();
        result.sums.shrink_to_fit();
        result.counts.shrink_to_fit();
        let num_groups = result.keys.len();

        let keys_ptr = result.keys.as_mut_ptr();
        let sums_ptr = result.sums.as_mut_ptr();
        let counts_ptr = result.counts.as_mut_ptr();
        std::mem::forget(result.keys);
        std::mem::forget(result.sums);
        std::mem::forget(result.counts);

        *out_keys = keys_ptr;
        *out_sums = sums_ptr;
        *out_counts = counts_ptr;
        *out_groups = num_groups;
        super::VANED_OK
    })
}

/// Reclaims the three buffers produced by `vaned_i64_groupby_sum`.
///
/// # Safety
/// Each pointer/`num_groups` pair must be exactly what a single
/// `vaned_i64_groupby_sum` call produced, not already freed.
#[no_mangle]
pub unsafe extern "C" fn vaned_i64_groupby_sum_destroy(keys: *mut i64, sums: *mut f64, counts: *mut u32, num_groups: usize) {
    if !keys.is_null() {
        drop(Vec::from_raw_parts(keys, num_groups, num_groups));
    }
    if !sums.is_null() {
        drop(Vec::from_raw_parts(sums, num_groups, num_groups));
    }
    if !counts.is_null() {
        drop(Vec::from_raw_parts(counts, num_groups, num_groups));
    }
}
