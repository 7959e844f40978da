//! C ABI surface: `#[no_mangle] extern "C"` entry points over the safe Rust
//! API, grouped by element type and operation family as the header this
//! module stands in for would be (column lifecycle, aggregations,
//! element-wise, filters, sorts, hashes, gathers, joins, group-by, chunked,
//! window/cumulative, horizontal folds, stats).
//!
//! No logic lives here: every function is a thin, panic-caught shim that
//! deref's its raw spans, calls into `kernel`/`column`/`join`/`groupby`, and
//! hands ownership of any result buffer back across the boundary via
//! `Box::into_raw`/`Vec::into_raw_parts`-style leaks, paired with an
//! explicit `_destroy` entry point that reclaims them. Caller contract
//! violations (null pointers, mismatched lengths) are undefined behavior,
//! exactly as in the safe API — these shims add no defensive checks beyond
//! `debug_assert!`.

pub mod column;
pub mod groupby;
pub mod join;
pub mod stats;

use crate::blitz;
use crate::simd::{self, SimdLevel};
use std::panic::{self, AssertUnwindSafe};

/// Status codes every fallible FFI entry returns. `0` is always success.
pub const VANED_OK: i32 = 0;
pub const VANED_ERR_ALLOCATION: i32 = 1;
pub const VANED_ERR_JOIN_TABLE_OVERFLOW: i32 = 2;
pub const VANED_ERR_POOL_INIT: i32 = 3;
pub const VANED_ERR_PANIC: i32 = 4;
pub const VANED_ERR_INVALID_ARGUMENT: i32 = 5;

pub(crate) fn status_of(err: &crate::error::KernelError) -> i32 {
    use crate::error::KernelError::*;
    match err {
        Allocation => VANED_ERR_ALLOCATION,
        JoinTableOverflow { .. } => VANED_ERR_JOIN_TABLE_OVERFLOW,
        PoolInit(_) => VANED_ERR_POOL_INIT,
    }
}

/// Runs `f`, converting an unwinding panic into [`VANED_ERR_PANIC`] instead
/// of crossing the FFI boundary (which is undefined behavior).
pub(crate) fn guard<F: FnOnce() -> i32>(f: F) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => VANED_ERR_PANIC,
    }
}

/// Explicitly starts the Blitz pool and resolves the host SIMD level.
/// Optional — every kernel entry lazily initialises on first use — but
/// embedders that want start-up cost paid before serving traffic can call
/// this once.
#[no_mangle]
pub extern "C" fn vaned_init() -> i32 {
    guard(|| match blitz::init() {
        Ok(()) => {
            simd::level();
            VANED_OK
        }
        Err(e) => status_of(&e),
    })
}

/// Overrides the process-wide SIMD dispatch level. `level` must be
/// `0..=3` (`Scalar, Vector128, Vector256, Vector512`); anything else is
/// rejected with [`VANED_ERR_INVALID_ARGUMENT`] rather than silently
/// clamped.
#[no_mangle]
pub extern "C" fn vaned_set_simd_level(level: i32) -> i32 {
    guard(|| {
        let level = match level {
            0 => SimdLevel::Scalar,
            1 => SimdLevel::Vector128,
            2 => SimdLevel::Vector256,
            3 => SimdLevel::Vector512,
            _ => return VANED_ERR_INVALID_ARGUMENT,
        };
        simd::set_level_override(level);
        VANED_OK
    })
}

/// Sets the Blitz worker count. Per the safe API, this only takes effect
/// on the pool's next `deinit`+init cycle if the pool is already running.
#[no_mangle]
pub extern "C" fn vaned_set_max_threads(threads: usize) {
    blitz::set_max_threads(threads);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_configure_round_trip() {
        assert_eq!(vaned_init(), VANED_OK);
        assert_eq!(vaned_set_simd_level(0), VANED_OK);
        assert_eq!(vaned_set_simd_level(99), VANED_ERR_INVALID_ARGUMENT);
        vaned_set_max_threads(2);
        blitz::deinit();
    }
}
