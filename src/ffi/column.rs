//! Per-element-type FFI families: column lifecycle, aggregations,
//! element-wise arithmetic/compare, filter, sort, gather, hash — plus the
//! `f64`-only families (chunked column, window/cumulative, horizontal
//! folds) that this crate does not duplicate across element types, mirroring
//! the stats helpers' own type-narrowing.
//!
//! One macro instantiation per element type keeps the four bodies
//! (`f64`/`f32`/`i64`/`i32`) textually identical, the same way the kernel
//! registry itself is written once and instantiated per type — the ABI's
//! per-type duplication is a header-level constraint, not a reason to
//! hand-duplicate the Rust body four times.

use super::guard;
use crate::column::Column;
use crate::kernel;
use crate::kernel::elementwise::CompareOp;
use crate::simd;
use std::slice;

fn compare_op_of(code: i32) -> Option<CompareOp> {
    Some(match code {
        0 => CompareOp::Gt,
        1 => CompareOp::Ge,
        2 => CompareOp::Lt,
        3 => CompareOp::Le,
        4 => CompareOp::Eq,
        5 => CompareOp::Ne,
        _ => return None,
    })
}

macro_rules! column_ffi_family {
    ($ty:ty, $create:ident, $destroy:ident, $len_fn:ident,
     $sum:ident, $min:ident, $max:ident, $mean:ident,
     $add_arrays:ident, $sub_arrays:ident, $mul_arrays:ident, $div_arrays:ident,
     $add_scalar:ident, $sub_scalar:ident, $mul_scalar:ident, $div_scalar:ident,
     $compare_scalar:ident, $compare_arrays:ident,
     $filter_gt:ident, $filter_lt:ident,
     $argsort:ident, $sort:ident,
     $gather:ident, $hash_array:ident) => {
        /// Creates a column by copying `len` elements from `data`.
        ///
        /// # Safety
        /// `data` must be valid for reads of `len` elements of this type.
        #[no_mangle]
        pub unsafe extern "C" fn $create(data: *const $ty, len: usize) -> *mut Column<$ty> {
            let slice = slice::from_raw_parts(data, len);
            Box::into_raw(Box::new(Column::from_slice(slice)))
        }

        /// Reclaims a column created by `$create`.
        ///
        /// # Safety
        /// `col` must be a pointer returned by `$create`, not already freed.
        #[no_mangle]
        pub unsafe extern "C" fn $destroy(col: *mut Column<$ty>) {
            if !col.is_null() {
                drop(Box::from_raw(col));
            }
        }

        /// # Safety
        /// `col` must be a live pointer from `$create`.
        #[no_mangle]
        pub unsafe extern "C" fn $len_fn(col: *const Column<$ty>) -> usize {
            (*col).len()
        }

        /// # Safety
        /// `data` must be valid for reads of `len` elements.
        #[no_mangle]
        pub unsafe extern "C" fn $sum(data: *const $ty, len: usize) -> $ty {
            let slice = slice::from_raw_parts(data, len);
            kernel::reduce::sum(slice, simd::level())
        }

        /// Writes `1` to `*out_valid` and returns the minimum, or writes
        /// `0` and returns a meaningless value for empty input.
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out_valid` valid for one write.
        #[no_mangle]
        pub unsafe extern "C" fn $min(data: *const $ty, len: usize, out_valid: *mut bool) -> $ty {
            let slice = slice::from_raw_parts(data, len);
            match kernel::reduce::min(slice, simd::level()) {
                Some(v) => {
                    *out_valid = true;
                    v
                }
                None => {
                    *out_valid = false;
                    <$ty as crate::element::Numeric>::ZERO
                }
            }
        }

        /// As `$min`, for the maximum.
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out_valid` valid for one write.
        #[no_mangle]
        pub unsafe extern "C" fn $max(data: *const $ty, len: usize, out_valid: *mut bool) -> $ty {
            let slice = slice::from_raw_parts(data, len);
            match kernel::reduce::max(slice, simd::level()) {
                Some(v) => {
                    *out_valid = true;
                    v
                }
                None => {
                    *out_valid = false;
                    <$ty as crate::element::Numeric>::ZERO
                }
            }
        }

        /// As `$min`, for the arithmetic mean (always `f64`-valued).
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out_valid` valid for one write.
        #[no_mangle]
        pub unsafe extern "C" fn $mean(data: *const $ty, len: usize, out_valid: *mut bool) -> f64 {
            let slice = slice::from_raw_parts(data, len);
            match kernel::reduce::mean(slice, simd::level()) {
                Some(v) => {
                    *out_valid = true;
                    v
                }
                None => {
                    *out_valid = false;
                    0.0
                }
            }
        }

        /// # Safety
        /// `a`, `b`, `out` each valid for `len` elements; `out` may alias
        /// neither `a` nor `b`.
        #[no_mangle]
        pub unsafe extern "C" fn $add_arrays(a: *const $ty, b: *const $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let b = slice::from_raw_parts(b, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::add_arrays(a, b, out, simd::level());
        }

        /// # Safety
        /// See `$add_arrays`.
        #[no_mangle]
        pub unsafe extern "C" fn $sub_arrays(a: *const $ty, b: *const $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let b = slice::from_raw_parts(b, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::sub_arrays(a, b, out, simd::level());
        }

        /// # Safety
        /// See `$add_arrays`.
        #[no_mangle]
        pub unsafe extern "C" fn $mul_arrays(a: *const $ty, b: *const $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let b = slice::from_raw_parts(b, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::mul_arrays(a, b, out, simd::level());
        }

        /// # Safety
        /// See `$add_arrays`.
        #[no_mangle]
        pub unsafe extern "C" fn $div_arrays(a: *const $ty, b: *const $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let b = slice::from_raw_parts(b, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::div_arrays(a, b, out, simd::level());
        }

        /// # Safety
        /// `a`, `out` each valid for `len` elements.
        #[no_mangle]
        pub unsafe extern "C" fn $add_scalar(a: *const $ty, scalar: $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::add_scalar(a, scalar, out, simd::level());
        }

        /// # Safety
        /// See `$add_scalar`.
        #[no_mangle]
        pub unsafe extern "C" fn $sub_scalar(a: *const $ty, scalar: $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::sub_scalar(a, scalar, out, simd::level());
        }

        /// # Safety
        /// See `$add_scalar`.
        #[no_mangle]
        pub unsafe extern "C" fn $mul_scalar(a: *const $ty, scalar: $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::mul_scalar(a, scalar, out, simd::level());
        }

        /// # Safety
        /// See `$add_scalar`.
        #[no_mangle]
        pub unsafe extern "C" fn $div_scalar(a: *const $ty, scalar: $ty, out: *mut $ty, len: usize) {
            let a = slice::from_raw_parts(a, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::elementwise::div_scalar(a, scalar, out, simd::level());
        }

        /// `op` is `0..=5` for `Gt, Ge, Lt, Le, Eq, Ne`; any other value
        /// returns [`super::VANED_ERR_INVALID_ARGUMENT`] without writing
        /// to `out`.
        ///
        /// # Safety
        /// `a` valid for `len` elements; `out` valid for `len` bytes.
        #[no_mangle]
        pub unsafe extern "C" fn $compare_scalar(a: *const $ty, threshold: $ty, op: i32, out: *mut u8, len: usize) -> i32 {
            guard(|| {
                let Some(op) = compare_op_of(op) else {
                    return super::VANED_ERR_INVALID_ARGUMENT;
                };
                let a = slice::from_raw_parts(a, len);
                let out = slice::from_raw_parts_mut(out, len);
                kernel::elementwise::compare_scalar(a, threshold, op, out);
                super::VANED_OK
            })
        }

        /// # Safety
        /// `a`, `b` valid for `len` elements; `out` valid for `len` bytes.
        #[no_mangle]
        pub unsafe extern "C" fn $compare_arrays(a: *const $ty, b: *const $ty, op: i32, out: *mut u8, len: usize) -> i32 {
            guard(|| {
                let Some(op) = compare_op_of(op) else {
                    return super::VANED_ERR_INVALID_ARGUMENT;
                };
                let a = slice::from_raw_parts(a, len);
                let b = slice::from_raw_parts(b, len);
                let out = slice::from_raw_parts_mut(out, len);
                kernel::elementwise::compare_arrays(a, b, op, out);
                super::VANED_OK
            })
        }

        /// Writes the indices of elements `> threshold` into a
        /// freshly-allocated buffer, leaked to the caller via
        /// `*out_indices`/`*out_count`; reclaim with
        /// [`super::indices_destroy`].
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out_indices`/`out_count` valid
        /// for one write each.
        #[no_mangle]
        pub unsafe extern "C" fn $filter_gt(data: *const $ty, len: usize, threshold: $ty, out_indices: *mut *mut i32, out_count: *mut usize) {
            let data = slice::from_raw_parts(data, len);
            let (indices, count) = kernel::filter::filter_gt(data, threshold);
            leak_indices(indices, count, out_indices, out_count);
        }

        /// As `$filter_gt`, for `< threshold`.
        ///
        /// # Safety
        /// See `$filter_gt`.
        #[no_mangle]
        pub unsafe extern "C" fn $filter_lt(data: *const $ty, len: usize, threshold: $ty, out_indices: *mut *mut i32, out_count: *mut usize) {
            let data = slice::from_raw_parts(data, len);
            let (indices, count) = kernel::filter::filter_lt(data, threshold);
            leak_indices(indices, count, out_indices, out_count);
        }

        /// Writes a stable permutation of `0..len` into `out`, ascending
        /// if `ascending != 0`.
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out` valid for `len` writes of
        /// `i32`.
        #[no_mangle]
        pub unsafe extern "C" fn $argsort(data: *const $ty, len: usize, ascending: i32, out: *mut i32) {
            let data = slice::from_raw_parts(data, len);
            let order = kernel::sort::argsort(data, ascending != 0, simd::level());
            slice::from_raw_parts_mut(out, len).copy_from_slice(&order);
        }

        /// Writes the sorted values into `out`.
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out` valid for `len` writes.
        #[no_mangle]
        pub unsafe extern "C" fn $sort(data: *const $ty, len: usize, ascending: i32, out: *mut $ty) {
            let data = slice::from_raw_parts(data, len);
            let sorted = kernel::sort::sort(data, ascending != 0, simd::level());
            slice::from_raw_parts_mut(out, len).copy_from_slice(&sorted);
        }

        /// Gathers `src[indices[i]]` into `out[i]`; out-of-range indices
        /// write this type's sentinel (NaN for floats, zero for
        /// integers).
        ///
        /// # Safety
        /// `src` valid for `src_len` reads, `indices`/`out` valid for
        /// `idx_len` elements each.
        #[no_mangle]
        pub unsafe extern "C" fn $gather(src: *const $ty, src_len: usize, indices: *const i32, idx_len: usize, out: *mut $ty) {
            let src = slice::from_raw_parts(src, src_len);
            let indices = slice::from_raw_parts(indices, idx_len);
            let out = slice::from_raw_parts_mut(out, idx_len);
            kernel::gather::gather(src, indices, out);
        }

        /// Writes the canonicalised hash of each element into `out`.
        ///
        /// # Safety
        /// `data` valid for `len` reads; `out` valid for `len` writes.
        #[no_mangle]
        pub unsafe extern "C" fn $hash_array(data: *const $ty, len: usize, out: *mut u64) {
            let data = slice::from_raw_parts(data, len);
            let out = slice::from_raw_parts_mut(out, len);
            kernel::hash::hash_array(data, out);
        }
    };
}

unsafe fn leak_indices(indices: Vec<i32>, count: usize, out_indices: *mut *mut i32, out_count: *mut usize) {
    let mut indices = indices;
    indices.shrink_to_fit();
    let ptr = indices.as_mut_ptr();
    std::mem::forget(indices);
    *out_indices = ptr;
    *out_count = count;
}

/// Reclaims an index buffer produced by any `*_filter_*` entry.
///
/// # Safety
/// `ptr` must be a pointer leaked by this module with the matching `len`
/// it was leaked with (the allocation's capacity, not necessarily `count`).
#[no_mangle]
pub unsafe extern "C" fn vaned_indices_destroy(ptr: *mut i32, len: usize) {
    if !ptr.is_null() {
        drop(Vec::from_raw_parts(ptr, len, len));
    }
}

column_ffi_family!(
    f64, 
    vaned_f64_column_create, vaned_f64_column_destroy, vaned_f64_column_len,
    vaned_f64_sum, vaned_f64_min, vaned_f64_max, vaned_f64_mean,
    vaned_f64_add_arrays, vaned_f64_sub_arrays, vaned_f64_mul_arrays, vaned_f64_div_arrays,
    vaned_f64_add_scalar, vaned_f64_sub_scalar, vaned_f64_mul_scalar, vaned_f64_div_scalar,
    vaned_f64_compare_scalar, vaned_f64_compare_arrays,
    vaned_f64_filter_gt, vaned_f64_filter_lt,
    vaned_f64_argsort, vaned_f64_sort,
    vaned_f64_gather, vaned_f64_hash_array
);

column_ffi_family!(
    f32, 
    vaned_f32_column_create, vaned_f32_column_destroy, vaned_f32_column_len,
    vaned_f32_sum, vaned_f32_min, vaned_f32_max, vaned_f32_mean,
    vaned_f32_add_arrays, vaned_f32_sub_arrays, vaned_f32_mul_arrays, vaned_f32_div_arrays,
    vaned_f32_add_scalar, vaned_f32_sub_scalar, vaned_f32_mul_scalar, vaned_f32_div_scalar,
    vaned_f32_compare_scalar, vaned_f32_compare_arrays,
    vaned_f32_filter_gt, vaned_f32_filter_lt,
    vaned_f32_argsort, vaned_f32_sort,
    vaned_f32_gather, vaned_f32_hash_array
);

column_ffi_family!(
    i64, 
    vaned_i64_column_create, vaned_i64_column_destroy, vaned_i64_column_len,
    vaned_i64_sum, vaned_i64_min, vaned_i64_max, vaned_i64_mean,
    vaned_i64_add_arrays, vaned_i64_sub_arrays, vaned_i64_mul_arrays, vaned_i64_div_arrays,
    vaned_i64_add_scalar, vaned_i64_sub_scalar, vaned_i64_mul_scalar, vaned_i64_div_scalar,
    vaned_i64_compare_scalar, vaned_i64_compare_arrays,
    vaned_i64_filter_gt, vaned_i64_filter_lt,
    vaned_i64_argsort, vaned_i64_sort,
    vaned_i64_gather, vaned_i64_hash_array
);

column_ffi_family!(
    i32, 
    vaned_i32_column_create, vaned_i32_column_destroy, vaned_i32_column_len,
    vaned_i32_sum, vaned_i32_min, vaned_i32_max, vaned_i32_mean,
    vaned_i32_add_arrays, vaned_i32_sub_arrays, vaned_i32_mul_arrays, vaned_i32_div_arrays,
    vaned_i32_add_scalar, vaned_i32_sub_scalar, vaned_i32_mul_scalar, vaned_i32_div_scalar,
    vaned_i32_compare_scalar, vaned_i32_compare_arrays,
    vaned_i32_filter_gt, vaned_i32_filter_lt,
    vaned_i32_argsort, vaned_i32_sort,
    vaned_i32_gather, vaned_i32_hash_array
);

/// Creates a chunked column by copying `len` `f64` elements from `data`.
/// `ChunkedColumn` is `f64`-only: L2-sized chunking targets the engine's
/// primary working type rather than every scalar width.
///
/// # Safety
/// `data` valid for reads of `len` elements.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_create(data: *const f64, len: usize) -> *mut crate::column::ChunkedColumn {
    let slice = slice::from_raw_parts(data, len);
    Box::into_raw(Box::new(crate::column::ChunkedColumn::from_slice(slice)))
}

/// # Safety
/// `col` must be a pointer from `vaned_chunked_create`, not already freed.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_destroy(col: *mut crate::column::ChunkedColumn) {
    if !col.is_null() {
        drop(Box::from_raw(col));
    }
}

/// # Safety
/// `col` must be a live pointer from `vaned_chunked_create`.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_sum(col: *const crate::column::ChunkedColumn) -> f64 {
    (*col).sum()
}

/// # Safety
/// `col` must be a live pointer; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_min(col: *const crate::column::ChunkedColumn, out_valid: *mut bool) -> f64 {
    match (*col).min() {
        Some(v) => {
            *out_valid = true;
            v
        }
        None => {
            *out_valid = false;
            0.0
        }
    }
}

/// As `vaned_chunked_min`, for the maximum.
///
/// # Safety
/// `col` must be a live pointer; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_max(col: *const crate::column::ChunkedColumn, out_valid: *mut bool) -> f64 {
    match (*col).max() {
        Some(v) => {
            *out_valid = true;
            v
        }
        None => {
            *out_valid = false;
            0.0
        }
    }
}

/// As `vaned_chunked_min`, for the arithmetic mean.
///
/// # Safety
/// `col` must be a live pointer; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_mean(col: *const crate::column::ChunkedColumn, out_valid: *mut bool) -> f64 {
    match (*col).mean() {
        Some(v) => {
            *out_valid = true;
            v
        }
        None => {
            *out_valid = false;
            0.0
        }
    }
}

/// Filters `col` to the rows `> threshold`, returning a freshly-allocated
/// chunked column. Reclaim with `vaned_chunked_destroy`.
///
/// # Safety
/// `col` must be a live pointer from `vaned_chunked_create`.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_filter_gt(col: *const crate::column::ChunkedColumn, threshold: f64) -> *mut crate::column::ChunkedColumn {
    Box::into_raw(Box::new((*col).filter_gt(threshold)))
}

/// As `vaned_chunked_filter_gt`, for `< threshold`.
///
/// # Safety
/// See `vaned_chunked_filter_gt`.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_filter_lt(col: *const crate::column::ChunkedColumn, threshold: f64) -> *mut crate::column::ChunkedColumn {
    Box::into_raw(Box::new((*col).filter_lt(threshold)))
}

/// Sorts `col`, returning a freshly-allocated chunked column holding the
/// sorted values. Reclaim with `vaned_chunked_destroy`.
///
/// # Safety
/// `col` must be a live pointer from `vaned_chunked_create`.
#[no_mangle]
pub unsafe extern "C" fn vaned_chunked_sort(col: *const crate::column::ChunkedColumn, ascending: i32) -> *mut crate::column::ChunkedColumn {
    Box::into_raw(Box::new((*col).sort(ascending != 0)))
}

/// # Safety
/// `data` valid for `len` reads; `out` valid for `len` writes.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_cumulative_sum(data: *const f64, len: usize, out: *mut f64) {
    let data = slice::from_raw_parts(data, len);
    let out = slice::from_raw_parts_mut(out, len);
    kernel::window::cumulative_sum(data, out);
}

/// # Safety
/// `data`/`out` valid for `len` elements; `window` must be nonzero.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_moving_sum(data: *const f64, len: usize, window: usize, out: *mut f64) {
    let data = slice::from_raw_parts(data, len);
    let out = slice::from_raw_parts_mut(out, len);
    kernel::window::moving_sum(data, window, out);
}

/// Row-wise sum across `n_columns` arrays of `len` `f64` each.
///
/// # Safety
/// `columns` must point to `n_columns` valid `*const f64`, each readable
/// for `len` elements; `out` valid for `len` writes.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_horizontal_sum(columns: *const *const f64, n_columns: usize, len: usize, out: *mut f64) {
    let column_ptrs = slice::from_raw_parts(columns, n_columns);
    let slices: Vec<&[f64]> = column_ptrs.iter().map(|&p| slice::from_raw_parts(p, len)).collect();
    let out = slice::from_raw_parts_mut(out, len);
    kernel::horizontal::horizontal_sum(&slices, out);
}
