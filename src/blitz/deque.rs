//! A bounded single-owner, multi-thief work-stealing deque (Chase-Lev
//! style): per-worker bounded deque with atomic index heads/tails, where
//! steal uses double-ended access with ABA protection.
//!
//! ABA is avoided the way the original Chase-Lev paper (and crossbeam-deque)
//! avoid it: `top`/`bottom` are monotonically increasing counters, never
//! reset, with the ring-buffer slot selected by masking — so a given raw
//! counter value is never reused to mean something else, and a losing
//! thief's stale read is simply discarded when its `compare_exchange` on
//! `top` fails. The thief races the owner and retries rather than relying
//! on an explicit version tag.
//!
//! The deque is **bounded**: `push` returns the task back to the caller if
//! the ring buffer is full, so submitters can fall back to another worker's
//! deque or block.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a steal attempt.
pub enum Steal<T> {
    /// The deque was empty.
    Empty,
    /// Another thief won the race for the only remaining item; retry.
    Retry,
    /// Successfully stole one item.
    Success(T),
}

struct Slot(UnsafeCell<MaybeUninit<Task>>);
// SAFETY: access to a given slot's contents is coordinated entirely through
// the `top`/`bottom` protocol below; only one thread ever observes a given
// write as "live" at a time.
unsafe impl Sync for Slot {}

pub struct Deque {
    buf: Box<[Slot]>,
    mask: usize,
    top: AtomicUsize,
    bottom: AtomicUsize,
}

impl Deque {
    /// `capacity` is rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot(UnsafeCell::new(MaybeUninit::uninit())));
        }
        Self {
            buf: slots.into_boxed_slice(),
            mask: capacity - 1,
            top: AtomicUsize::new(0),
            bottom: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        let b = self.bottom.load(Ordering::Relaxed);
        let t = self.top.load(Ordering::Relaxed);
        b.wrapping_sub(t).min(self.buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes a task onto the bottom of the deque. Only the owning worker
    /// thread may call this. Returns `Err(task)` if the deque is full.
    pub fn push(&self, task: Task) -> Result<(), Task> {
        let b = self.bottom.load(Ordering::Relaxed);
        let t = self.top.load(Ordering::Acquire);
        if b.wrapping_sub(t) >= self.buf.len() {
            return Err(task);
        }
        let idx = b & self.mask;
        // SAFETY: slot `idx` is not concurrently read by a thief until
        // `bottom` advances past `b`, which happens after this write.
        unsafe {
            (*self.buf[idx].0.get()).write(task);
        }
        fence(Ordering::Release);
        self.bottom.store(b.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Pops a task from the bottom of the deque (LIFO). Only the owning
    /// worker thread may call this.
    pub fn pop(&self) -> Option<Task> {
        let old_b = self.bottom.load(Ordering::Relaxed);
        let new_b = old_b.wrapping_sub(1);
        self.bottom.store(new_b, Ordering::Relaxed);
        fence(Ordering::SeqCst);
        let t = self.top.load(Ordering::Relaxed);

        // Signed comparison on wrapping counters: `t > new_b` means the
        // deque was already empty before we touched it.
        if (t.wrapping_sub(new_b) as isize) > 0 {
            self.bottom.store(old_b, Ordering::Relaxed);
            return None;
        }

        let idx = new_b & self.mask;
        if t == new_b {
            // Exactly one element left: settle the race with any thief
            // *before* touching the slot, so only the winner ever reads it.
            let won = self
                .top
                .compare_exchange(t, t.wrapping_add(1), Ordering::SeqCst, Ordering::Relaxed)
                .is_ok();
            self.bottom.store(old_b, Ordering::Relaxed);
            if !won {
                return None;
            }
            // SAFETY: we won the top CAS, so no thief holds or will obtain
            // a reference to this slot.
            return Some(unsafe { (*self.buf[idx].0.get()).assume_init_read() });
        }

        // `t < new_b` strictly: no thief can be targeting this slot right
        // now, since a thief only ever reads at index `top`, and
        // `top <= t < new_b`.
        // SAFETY: see above.
        Some(unsafe { (*self.buf[idx].0.get()).assume_init_read() })
    }

    /// Attempts to steal one task from the top of the deque. Safe to call
    /// from any thread, including the owner (though owners should prefer
    /// `pop`).
    pub fn steal(&self) -> Steal<Task> {
        let t = self.top.load(Ordering::Acquire);
        fence(Ordering::SeqCst);
        let b = self.bottom.load(Ordering::Acquire);
        if t.wrapping_sub(b) as isize >= 0 {
            return Steal::Empty;
        }
        let idx = t & self.mask;
        // SAFETY: `t < b`, so slot `idx` holds a task the owner has not yet
        // reclaimed with `pop`. A racing `pop`/`steal` may also read this
        // slot; the `compare_exchange` below determines who actually wins
        // ownership, matching the published Chase-Lev protocol.
        let task = unsafe { (*self.buf[idx].0.get()).assume_init_read() };
        if self
            .top
            .compare_exchange(t, t.wrapping_add(1), Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            Steal::Success(task)
        } else {
            std::mem::forget(task);
            Steal::Retry
        }
    }
}
