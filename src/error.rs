//! Crate-wide error types.
//!
//! The kernel is total by construction: well-formed spans produce defined
//! outputs and malformed calls are caller contract violations, not
//! recoverable errors. The error type here is reserved for operations that
//! are genuinely fallible — allocation failure in handle-returning ops, and
//! hash-table sizing overflow in the join engine.

use thiserror::Error;

/// Errors surfaced by handle-returning kernel operations.
///
/// Caller-contract violations (null pointers, mismatched lengths, concurrent
/// mutation of a buffer a kernel is reading) are undefined behavior and are
/// not represented here — they are documented preconditions, not values
/// callers can recover from.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A handle-returning operation could not allocate its result buffers.
    #[error("allocation failure while materialising kernel output")]
    Allocation,

    /// The chained hash table's bucket count would overflow `u32`/`i32`
    /// indexing at the requested build-side cardinality.
    #[error("hash table sizing overflow building table for {n} rows")]
    JoinTableOverflow { n: usize },

    /// The work-stealing pool failed to spin up its worker threads.
    #[error("blitz pool failed to initialise: {0}")]
    PoolInit(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
