//! Column storage: the plain owned [`owned::Column`] and the L2-sized
//! [`chunked::ChunkedColumn`] built on top of it.

pub mod chunked;
pub mod owned;

pub use chunked::ChunkedColumn;
pub use owned::Column;
