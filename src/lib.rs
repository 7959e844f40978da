//! # vaned — a columnar in-memory compute kernel
//!
//! `vaned` exposes analytical primitives over dense numeric arrays
//! (`f64`, `f32`, `i64`, `i32`): SIMD-dispatched aggregations and
//! element-wise arithmetic, filter/compaction, sort/argsort, a hash-join
//! engine, and a group-by engine, all running on a work-stealing thread
//! pool ("Blitz") this crate owns end to end.
//!
//! ## Memory layout
//!
//! Columns are flat, contiguous buffers (`Vec<E>` in [`column::Column`],
//! fixed-length chunks of those in [`column::ChunkedColumn`]) — never an
//! array of per-row structures. The same reasoning that makes a
//! structure-of-arrays layout fast for a flat vector search applies here:
//! the reduction/filter/sort loops walk a single allocation sequentially
//! instead of chasing pointers, keeping the SIMD loops in
//! [`kernel::reduce`]/[`kernel::elementwise`] fed from the cache lines
//! they just prefetched.
//!
//! ## Module map
//!
//! - [`config`] — process-global runtime tunables (SIMD override, thread
//!   count, parallel-dispatch thresholds).
//! - [`error`] — the crate's fallible-operation error type.
//! - [`element`] — the sealed `Numeric` element-type abstraction kernels
//!   are generic over.
//! - [`simd`] — runtime vector-width detection and lane-count resolution.
//! - [`kernel`] — the per-operation compute registry: reduce, elementwise,
//!   filter, gather, hash, sort.
//! - [`blitz`] — the work-stealing parallel execution pool, and
//!   [`blitz::driver`], the threshold-gated dispatch layer built on it.
//! - [`column`] — owned and L2-chunked column storage.
//! - [`join`] — the chained hash-join engine (inner/left).
//! - [`groupby`] — the group-by engine (dense group ids, per-group
//!   aggregation).
//! - [`stats`] — median/variance/skewness/correlation as plain formulas
//!   over [`kernel::reduce`].
//! - [`ffi`] — the `#[no_mangle] extern "C"` entry points.

pub mod blitz;
pub mod column;
pub mod config;
pub mod element;
pub mod error;
pub mod ffi;
pub mod groupby;
pub mod join;
pub mod kernel;
pub mod simd;
pub mod stats;

pub use column::{ChunkedColumn, Column};
pub use element::Numeric;
pub use error::{KernelError, Result};
pub use simd::SimdLevel;

/// Initialises the Blitz thread pool and resolves the host's SIMD level.
///
/// Not required before calling any kernel — both initialise lazily on
/// first use — but embedders that want pool start-up cost paid up front
/// (e.g. before a latency-sensitive request loop starts) can call this
/// once at process start.
pub fn init() -> Result<()> {
    blitz::init()?;
    simd::level();
    Ok(())
}
