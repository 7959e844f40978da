//! CPU feature runtime.
//!
//! Detects the highest supported vector width at first use and caches it in
//! a process-wide atomic. All dispatch elsewhere in the crate reads this
//! cached level exactly once per call, outside any hot loop.
//!
//! The detected level never changes on its own; [`set_level_override`]
//! exists purely so tests (and embedders who know better than the detector)
//! can pin a lower level. The override is an unsynchronised, last-writer-
//! wins store: configuration set once before kernels run, not a value safe
//! to flip mid-query.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// A selected SIMD dispatch level, ordered from weakest to strongest.
///
/// `PartialOrd`/`Ord` follow declaration order, so `level <= detected` is a
/// valid "highest implementation at or below the current level" check,
/// matching the kernel registry's resolution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SimdLevel {
    /// No vectorization; scalar loop, width 1.
    Scalar = 0,
    /// 128-bit lanes (SSE4.1 on x86_64, NEON on aarch64).
    Vector128 = 1,
    /// 256-bit lanes (AVX2).
    Vector256 = 2,
    /// 512-bit lanes (AVX-512F).
    Vector512 = 3,
}

impl SimdLevel {
    /// Vector width in bytes; `1` for the scalar level.
    pub fn width_bytes(self) -> usize {
        match self {
            SimdLevel::Scalar => 1,
            SimdLevel::Vector128 => 16,
            SimdLevel::Vector256 => 32,
            SimdLevel::Vector512 => 64,
        }
    }

    /// The number of `E`-sized elements that fit in one vector register at
    /// this level; always `1` for the scalar level.
    pub fn lanes<E>(self) -> usize {
        let elem = std::mem::size_of::<E>().max(1);
        (self.width_bytes() / elem).max(1)
    }

    /// Human-readable ISA name, for logging and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Vector128 => "vector128",
            SimdLevel::Vector256 => "vector256",
            SimdLevel::Vector512 => "vector512",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SimdLevel::Vector128,
            2 => SimdLevel::Vector256,
            3 => SimdLevel::Vector512,
            _ => SimdLevel::Scalar,
        }
    }
}

static CACHED_LEVEL: AtomicU8 = AtomicU8::new(u8::MAX);
static DETECTED_ONCE: OnceLock<SimdLevel> = OnceLock::new();

/// Probes the host CPU for the highest vectorization level this crate has
/// kernel bodies for. Runs once; subsequent calls return the cached result.
#[cfg(target_arch = "x86_64")]
fn detect() -> SimdLevel {
    if std::is_x86_feature_detected!("avx512f") {
        SimdLevel::Vector512
    } else if std::is_x86_feature_detected!("avx2") {
        SimdLevel::Vector256
    } else if std::is_x86_feature_detected!("sse4.1") {
        SimdLevel::Vector128
    } else {
        SimdLevel::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> SimdLevel {
    if std::arch::is_aarch64_feature_detected!("neon") {
        SimdLevel::Vector128
    } else {
        SimdLevel::Scalar
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> SimdLevel {
    SimdLevel::Scalar
}

/// Returns the currently active dispatch level, detecting and caching it on
/// first call.
pub fn level() -> SimdLevel {
    let raw = CACHED_LEVEL.load(Ordering::Relaxed);
    if raw != u8::MAX {
        return SimdLevel::from_u8(raw);
    }
    let detected = *DETECTED_ONCE.get_or_init(detect);
    tracing::debug!(level = detected.name(), "simd: detected host capability");
    CACHED_LEVEL.store(detected as u8, Ordering::Relaxed);
    detected
}

/// Overrides the cached dispatch level process-wide, without re-probing the
/// host. Affects every subsequent dispatch. Not synchronized against
/// concurrent kernel execution — callers must set this before kernels run.
pub fn set_level_override(level: SimdLevel) {
    tracing::debug!(level = level.name(), "simd: level overridden");
    CACHED_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Resets the cached level back to "not yet probed", so the next call to
/// [`level`] re-detects. Test-only: production code should never need to
/// un-override.
#[cfg(test)]
pub(crate) fn reset_for_test() {
    CACHED_LEVEL.store(u8::MAX, Ordering::Relaxed);
}
