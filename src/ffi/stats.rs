//! FFI over the `f64`-only `stats` helpers.

use crate::stats;
use std::slice;

/// Writes `1` to `*out_valid` and returns the median, or `0`/a meaningless
/// value for empty input.
///
/// # Safety
/// `data` valid for `len` reads; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_median(data: *const f64, len: usize, out_valid: *mut bool) -> f64 {
    let data = slice::from_raw_parts(data, len);
    match stats::median(data) {
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
/// `data` valid for `len` reads; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_variance(data: *const f64, len: usize, out_valid: *mut bool) -> f64 {
    let data = slice::from_raw_parts(data, len);
    match stats::variance(data) {
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
/// `data` valid for `len` reads; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_stddev(data: *const f64, len: usize, out_valid: *mut bool) -> f64 {
    let data = slice::from_raw_parts(data, len);
    match stats::stddev(data) {
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

/// Returns `0` via `*out_valid` for empty or zero-variance input, where
/// skewness is undefined.
///
/// # Safety
/// `data` valid for `len` reads; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_skewness(data: *const f64, len: usize, out_valid: *mut bool) -> f64 {
    let data = slice::from_raw_parts(data, len);
    match stats::skewness(data) {
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

/// Returns `0` via `*out_valid` for mismatched lengths, empty input, or a
/// zero-variance operand.
///
/// # Safety
/// `a`/`b` valid for `len` reads; `out_valid` valid for one write.
#[no_mangle]
pub unsafe extern "C" fn vaned_f64_correlation(a: *const f64, b: *const f64, len: usize, out_valid: *mut bool) -> f64 {
    let a = slice::from_raw_parts(a, len);
    let b = slice::from_raw_parts(b, len);
    match stats::correlation(a, b) {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_ffi_matches_safe_api() {
        let data = [3.0, 1.0, 2.0];
        let mut valid = false;
        let result = unsafe { vaned_f64_median(data.as_ptr(), data.len(), &mut valid) };
        assert!(valid);
        assert_eq!(result, 2.0);
    }

    #[test]
    fn correlation_ffi_reports_invalid_on_constant_series() {
        let a = [1.0, 2.0, 3.0];
        let b = [7.0, 7.0, 7.0];
        let mut valid = true;
        let result = unsafe { vaned_f64_correlation(a.as_ptr(), b.as_ptr(), a.len(), &mut valid) };
        assert!(!valid);
        assert_eq!(result, 0.0);
    }
}
