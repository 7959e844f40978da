//! FFI over the hash-join engine, keyed on `i64` — the join key type is
//! narrowed to one integer width here the same way `stats` is narrowed to
//! `f64`: the per-type duplication the rest of `ffi::column` carries is a
//! property of the element-wise/aggregation kernels, not a blanket
//! requirement on every family.

use super::{guard, status_of};
use crate::join;
use std::slice;

unsafe fn leak_pair(left: Vec<i32>, right: Vec<i32>, out_left: *mut *mut i32, out_right: *mut *mut i32, out_count: *mut usize) {
    let mut left = left;
    let mut right = right;
    left.shrink_to_fit();
    right.shrink_to_fit();
    let count = left.len();
    let left_ptr = left.as_mut_ptr();
    let right_ptr = right.as_mut_ptr();
    std::mem::forget(left);
    std::mem::forget(right);
    *out_left = left_ptr;
    *out_right = right_ptr;
    *out_count = count;
}

/// Inner-joins `left` against `right` on equality, writing matched row
/// index pairs to freshly allocated `*out_left`/`*out_right` buffers of
/// `*out_count` entries. Reclaim with [`vaned_join_pairs_destroy`].
///
/// # Safety
/// `left`/`right` valid for `left_len`/`right_len` reads; the three `out_*`
/// pointers valid for one write each.
#[no_mangle]
pub unsafe extern "C" fn vaned_i64_inner_join(
    left: *const i64,
    left_len: usize,
    right: *const i64,
    right_len: usize,
    max_matches: usize,
    out_left: *mut *mut i32,
    out_right: *mut *mut i32,
    out_count: *mut usize,
) -> i32 {
    guard(|| {
        let left_slice = slice::from_raw_parts(left, left_len);
        let right_slice = slice::from_raw_parts(right, right_len);
        match join::inner_join(left_slice, right_slice, max_matches) {
            Ok(result) => {
                leak_pair(result.left_indices, result.right_indices, out_left, out_right, out_count);
                super::VANED_OK
            }
            Err(e) => status_of(&e),
        }
    })
}

/// Left-joins `left` against `right`, writing unmatched left rows with a
/// `-1` right index. Ordering is left-major, ascending. See
/// `vaned_i64_inner_join` for the buffer-ownership contract.
///
/// # Safety
/// Same as `vaned_i64_inner_join`.
#[no_mangle]
pub unsafe extern "C" fn vaned_i64_left_join(
    left: *const i64,
    left_len: usize,
    right: *const i64,
    right_len: usize,
    max_matches: usize,
    out_left: *mut *mut i32,
    out_right: *mut *mut i32,
    out_count: *mut usize,
) -> i32 {
    guard(|| {
        let left_slice = slice::from_raw_parts(left, left_len);
        let right_slice = slice::from_raw_parts(right, right_len);
        match join::left_join(left_slice, right_slice, max_matches) {
            Ok(result) => {
                leak_pair(result.left_indices, result.right_indices, out_left, out_right, out_count);
                super::VANED_OK
            }
            Err(e) => status_of(&e),
        }
    })
}

/// Reclaims a pair of index buffers leaked by either join entry point.
///
/// # Safety
/// `left`/`right` must be the exact pointers and `count` the exact length
/// returned together by a single join call, not already freed.
#[no_mangle]
pub unsafe extern "C" fn vaned_join_pairs_destroy(left: *mut i32, right: *mut i32, count: usize) {
    if !left.is_null() {
        drop(Vec::from_raw_parts(left, count, count));
    }
    if !right.is_null() {
        drop(Vec::from_raw_parts(right, count, count));
    }
}
