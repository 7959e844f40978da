//! The parallel driver: decides whether an operation is worth
//! parallelising, partitions it into chunks, dispatches chunks onto the
//! pool, and combines the partial results.
//!
//! `parallel_for` is the one primitive every `maybe_parallel_*` helper here
//! is built on. Kernels above this layer stay oblivious to the pool; they
//! only see a synchronous function call that either ran inline or was
//! fanned out and joined before returning.

use super::latch::CountdownLatch;
use std::ops::Range;

/// Runs `f` once per `[start, end)` chunk of `0..total`, chunks of
/// (approximately) `chunk_len` elements, fanned out across the pool and
/// joined via a countdown latch before returning.
///
/// `total <= chunk_len` (or a single resulting chunk) runs `f` inline
/// without touching the pool at all.
pub fn parallel_for<F>(total: usize, chunk_len: usize, f: F)
where
    F: Fn(Range<usize>) + Sync,
{
    if total == 0 {
        return;
    }
    let chunk_len = chunk_len.max(1);
    let n_chunks = total.div_ceil(chunk_len);
    if n_chunks <= 1 {
        f(0..total);
        return;
    }

    let latch = CountdownLatch::new(n_chunks);

    // SAFETY: this function does not return until `latch.wait()` confirms
    // every dispatched chunk has run and called `count_down`, so `f` is
    // never invoked after this stack frame would otherwise have dropped it.
    // Extending its lifetime to `'static` is sound only under that
    // invariant, which every call site below preserves.
    let f_static: &'static (dyn Fn(Range<usize>) + Sync) =
        unsafe { std::mem::transmute::<&(dyn Fn(Range<usize>) + Sync), _>(&f as &_) };

    for c in 0..n_chunks {
        let start = c * chunk_len;
        let end = (start + chunk_len).min(total);
        let latch = latch.clone();
        super::submit(Box::new(move || {
            f_static(start..end);
            latch.count_down();
        }));
    }

    latch.wait();
}

struct SendConstPtr<T>(*const T);
unsafe impl<T: Sync> Send for SendConstPtr<T> {}
unsafe impl<T: Sync> Sync for SendConstPtr<T> {}

struct SendMutPtr<T>(*mut T);
unsafe impl<T: Send> Send for SendMutPtr<T> {}
unsafe impl<T: Send> Sync for SendMutPtr<T> {}

/// Runs a chunked, combined reduction if `data` clears the parallel
/// threshold, otherwise reduces it inline on the calling thread; the
/// threshold itself lives in [`crate::config`].
pub fn maybe_parallel_reduce<T, Acc, Local, Combine>(
    data: &[T],
    identity: Acc,
    local: Local,
    combine: Combine,
) -> Acc
where
    T: Sync,
    Acc: Copy + Send,
    Local: Fn(&[T]) -> Acc + Sync,
    Combine: Fn(Acc, Acc) -> Acc,
{
    let len = data.len();
    if len == 0 {
        return identity;
    }
    if len < crate::config::parallel_threshold() {
        return local(data);
    }

    let chunk_len = crate::config::group_size().max(1);
    let n_chunks = len.div_ceil(chunk_len);
    let mut partials = vec![identity; n_chunks];

    let data_ptr = SendConstPtr(data.as_ptr());
    let partials_ptr = SendMutPtr(partials.as_mut_ptr());

    parallel_for(len, chunk_len, move |range| {
        let chunk = range.start / chunk_len;
        // SAFETY: `range` is within `0..len`, `data_ptr` points at `len`
        // live elements, and distinct chunks write distinct `partials`
        // slots, so no two tasks ever touch the same memory.
        let slice = unsafe { std::slice::from_raw_parts(data_ptr.0, len) };
        let value = local(&slice[range]);
        unsafe {
            *partials_ptr.0.add(chunk) = value;
        }
    });

    partials.into_iter().fold(identity, combine)
}

/// Runs a chunked, element-wise map if `src` clears the parallel threshold,
/// otherwise maps inline.
pub fn maybe_parallel_map<T, U, F>(src: &[T], out: &mut [U], f: F)
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    assert_eq!(src.len(), out.len());
    let len = src.len();
    if len == 0 {
        return;
    }
    if len < crate::config::parallel_threshold() {
        for (dst, v) in out.iter_mut().zip(src.iter()) {
            *dst = f(v);
        }
        return;
    }

    let chunk_len = crate::config::group_size().max(1);
    let src_ptr = SendConstPtr(src.as_ptr());
    let out_ptr = SendMutPtr(out.as_mut_ptr());

    parallel_for(len, chunk_len, move |range| {
        for i in range {
            // SAFETY: `i < len`; chunks are disjoint ranges so each output
            // slot is written by exactly one task.
            let v = unsafe { &*src_ptr.0.add(i) };
            let mapped = f(v);
            unsafe {
                *out_ptr.0.add(i) = mapped;
            }
        }
    });
}

fn sequential_filter<T, P>(data: &[T], predicate: &P) -> (Vec<i32>, usize)
where
    P: Fn(&T) -> bool,
{
    let mut out = Vec::new();
    for (i, v) in data.iter().enumerate() {
        if predicate(v) {
            out.push(i as i32);
        }
    }
    let count = out.len();
    (out, count)
}

/// Chunk-parallel filter: two passes over `data`, a per-chunk count
/// followed by an exclusive prefix sum over chunk counts giving each
/// chunk's base offset into the compacted output, then a second pass
/// where every chunk writes its matches starting at that offset. Below
/// the parallel threshold this degrades to a single sequential pass.
pub fn maybe_parallel_filter<T, P>(data: &[T], predicate: P) -> (Vec<i32>, usize)
where
    T: Sync,
    P: Fn(&T) -> bool + Sync,
{
    let len = data.len();
    if len < crate::config::parallel_threshold() {
        return sequential_filter(data, &predicate);
    }

    let chunk_len = crate::config::group_size().max(1);
    let n_chunks = len.div_ceil(chunk_len);
    let mut counts = vec![0usize; n_chunks];

    let data_ptr = SendConstPtr(data.as_ptr());
    let counts_ptr = SendMutPtr(counts.as_mut_ptr());
    let pred_ref = &predicate;

    parallel_for(len, chunk_len, move |range| {
        let chunk = range.start / chunk_len;
        // SAFETY: see `maybe_parallel_reduce`; read-only pass.
        let slice = unsafe { std::slice::from_raw_parts(data_ptr.0, len) };
        let c = slice[range].iter().filter(|v| pred_ref(v)).count();
        unsafe {
            *counts_ptr.0.add(chunk) = c;
        }
    });

    let mut offsets = vec![0usize; n_chunks + 1];
    for i in 0..n_chunks {
        offsets[i + 1] = offsets[i] + counts[i];
    }
    let total = offsets[n_chunks];
    let mut out = vec![0i32; total];

    let out_ptr = SendMutPtr(out.as_mut_ptr());
    let offsets_ref = &offsets;
    let pred_ref = &predicate;

    parallel_for(len, chunk_len, move |range| {
        let chunk = range.start / chunk_len;
        let slice = unsafe { std::slice::from_raw_parts(data_ptr.0, len) };
        let mut w = offsets_ref[chunk];
        for i in range {
            if pred_ref(&slice[i]) {
                // SAFETY: each chunk's writes stay within
                // `[offsets[chunk], offsets[chunk + 1])`, a disjoint
                // sub-range of `out` reserved for it by the prefix sum.
                unsafe {
                    *out_ptr.0.add(w) = i as i32;
                }
                w += 1;
            }
        }
    });

    (out, total)
}
