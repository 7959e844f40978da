//! The work-stealing pool, "Blitz".
//!
//! A single process-wide pool, lazily initialised by the first kernel that
//! decides to go parallel. Each worker owns a
//! [`deque::Deque`]; idle workers steal from a randomly chosen victim, and
//! park on a condition variable after a bounded number of failed steal
//! attempts. The only blocking points are the parallel-for barrier
//! ([`latch::CountdownLatch::wait`]) and worker park/unpark — kernels
//! themselves never suspend.

pub mod deque;
pub mod driver;
pub mod latch;

use deque::{Deque, Steal, Task};
use latch::CountdownLatch;
use parking_lot::{Condvar, Mutex};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Capacity of each worker's local deque. Deliberately bounded; a
/// submission that finds every deque full falls back to running inline
/// rather than growing unboundedly.
const DEQUE_CAPACITY: usize = 8192;

/// Bounded retries an idle worker makes stealing before it parks.
const STEAL_RETRIES: usize = 64;

/// Park timeout: workers periodically re-scan even without an explicit
/// wake, as a defence against a missed-wakeup race between a submitter's
/// `notify` and a worker observing `sleeping` just before parking.
const PARK_TIMEOUT: Duration = Duration::from_millis(5);

static MAX_THREADS: AtomicUsize = AtomicUsize::new(0); // 0 == auto-detect
static AUTO_DETECTED: AtomicBool = AtomicBool::new(true);
static POOL: Mutex<Option<Arc<Blitz>>> = Mutex::new(None);

thread_local! {
    static CURRENT_WORKER: Cell<Option<usize>> = const { Cell::new(None) };
}

struct Shared {
    deques: Vec<Arc<Deque>>,
    parked_gate: Mutex<()>,
    condvar: Condvar,
    sleeping: AtomicUsize,
    shutdown: AtomicBool,
    next_submit: AtomicUsize,
}

/// The pool itself. Obtain the process-wide instance via [`Blitz::global`];
/// most callers should instead use the free functions in this module
/// ([`init`], [`submit`], [`parallel_for`], [`deinit`]).
pub struct Blitz {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

fn resolve_worker_count() -> usize {
    let configured = MAX_THREADS.load(Ordering::Relaxed);
    if configured == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        configured
    }
}

/// Overrides the worker count for the *next* pool initialisation.
/// `threads == 0` re-enables auto-detection. Changing this after the pool
/// is already running does not resize it — the new value only takes
/// effect after [`deinit`] + the next lazy (re-)initialisation.
pub fn set_max_threads(threads: usize) {
    MAX_THREADS.store(threads, Ordering::Relaxed);
    AUTO_DETECTED.store(threads == 0, Ordering::Relaxed);
    tracing::debug!(threads, "blitz: max_threads configured");
}

/// `true` if the worker count currently in effect for the next init is
/// auto-detected rather than pinned via [`set_max_threads`].
pub fn is_auto_detected() -> bool {
    AUTO_DETECTED.load(Ordering::Relaxed)
}

/// `true` if the pool is currently running.
pub fn is_initialized() -> bool {
    POOL.lock().is_some()
}

/// Returns the running pool, lazily spinning it up if needed. Idempotent:
/// repeated calls on an already-initialised pool are no-ops beyond the
/// `Arc` clone.
pub fn global() -> Arc<Blitz> {
    let mut guard = POOL.lock();
    if let Some(pool) = guard.as_ref() {
        return pool.clone();
    }
    let pool = Arc::new(Blitz::new(resolve_worker_count()));
    *guard = Some(pool.clone());
    pool
}

/// Explicitly initialises the pool if it is not already running. Returns
/// success even if the pool was already initialised.
pub fn init() -> crate::error::Result<()> {
    let _ = global();
    Ok(())
}

/// Joins all workers and tears the pool down. A no-op if the pool is not
/// currently initialised. A submission after `deinit` re-initialises
/// lazily on its next call.
pub fn deinit() {
    let pool = POOL.lock().take();
    if let Some(pool) = pool {
        pool.shutdown();
    }
}

/// Number of workers in the currently running pool, or the count that
/// *would* be used if initialised now.
pub fn worker_count() -> usize {
    match POOL.lock().as_ref() {
        Some(p) => p.worker_count,
        None => resolve_worker_count(),
    }
}

/// Submits a task to the pool (lazily initialising it). Prefer
/// [`parallel_for`] for data-parallel work; this is the lower-level
/// primitive it is built on.
pub fn submit(task: Task) {
    global().submit(task);
}

impl Blitz {
    fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let deques: Vec<Arc<Deque>> = (0..worker_count)
            .map(|_| Arc::new(Deque::with_capacity(DEQUE_CAPACITY)))
            .collect();
        let shared = Arc::new(Shared {
            deques,
            parked_gate: Mutex::new(()),
            condvar: Condvar::new(),
            sleeping: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            next_submit: AtomicUsize::new(0),
        });

        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let shared = shared.clone();
            let handle = std::thread::Builder::new()
                .name(format!("blitz-{id}"))
                .spawn(move || worker_loop(id, shared))
                .expect("failed to spawn blitz worker thread");
            handles.push(handle);
        }

        tracing::debug!(workers = worker_count, "blitz: pool initialised");
        Blitz {
            shared,
            workers: Mutex::new(handles),
            worker_count,
        }
    }

    fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        {
            let _gate = self.shared.parked_gate.lock();
            self.shared.condvar.notify_all();
        }
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        tracing::debug!("blitz: pool torn down");
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Submits a task. A caller running on a worker thread pushes to its
    /// own deque; any other caller round-robins across deques.
    pub fn submit(&self, task: Task) {
        let deques = &self.shared.deques;
        let target = CURRENT_WORKER
            .with(|c| c.get())
            .unwrap_or_else(|| self.shared.next_submit.fetch_add(1, Ordering::Relaxed) % deques.len());

        let mut remaining = task;
        for offset in 0..deques.len() {
            let idx = (target + offset) % deques.len();
            match deques[idx].push(remaining) {
                Ok(()) => {
                    self.wake_one();
                    return;
                }
                Err(back) => remaining = back,
            }
        }
        // Every deque is full: run inline rather than growing unboundedly
        // (the deque is deliberately bounded).
        tracing::debug!("blitz: all worker deques full, running task inline");
        remaining();
    }

    fn wake_one(&self) {
        if self.shared.sleeping.load(Ordering::SeqCst) > 0 {
            let _gate = self.shared.parked_gate.lock();
            self.shared.condvar.notify_one();
        }
    }
}

fn worker_loop(id: usize, shared: Arc<Shared>) {
    CURRENT_WORKER.with(|c| c.set(Some(id)));
    let mut rng = splitmix_seed(id);

    loop {
        if let Some(task) = shared.deques[id].pop() {
            task();
            continue;
        }

        if let Some(task) = try_steal(id, &shared, &mut rng) {
            task();
            continue;
        }

        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        park_until_woken(id, &shared);

        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }
    }
}

fn try_steal(id: usize, shared: &Shared, rng: &mut u64) -> Option<Task> {
    let n = shared.deques.len();
    if n <= 1 {
        return None;
    }
    for _ in 0..STEAL_RETRIES {
        *rng = crate::kernel::hash::splitmix64(*rng);
        let victim = (*rng as usize) % n;
        if victim == id {
            continue;
        }
        match shared.deques[victim].steal() {
            Steal::Success(task) => return Some(task),
            Steal::Retry => continue,
            Steal::Empty => continue,
        }
    }
    None
}

fn park_until_woken(id: usize, shared: &Shared) {
    shared.sleeping.fetch_add(1, Ordering::SeqCst);
    {
        let mut gate = shared.parked_gate.lock();
        if !shared.shutdown.load(Ordering::SeqCst) && shared.deques[id].is_empty() {
            shared.condvar.wait_for(&mut gate, PARK_TIMEOUT);
        }
    }
    shared.sleeping.fetch_sub(1, Ordering::SeqCst);
}

fn splitmix_seed(id: usize) -> u64 {
    crate::kernel::hash::splitmix64(0x9e3779b97f4a7c15 ^ (id as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;

    #[test]
    fn parallel_for_runs_every_chunk_exactly_once() {
        let total = 10_000usize;
        let touched: Vec<Counter> = (0..total).map(|_| Counter::new(0)).collect();
        let touched = Arc::new(touched);
        {
            let touched = touched.clone();
            driver::parallel_for(total, 97, move |range| {
                for i in range {
                    touched[i].fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        for c in touched.iter() {
            assert_eq!(c.load(Ordering::SeqCst), 1);
        }
        deinit();
    }

    #[test]
    fn set_max_threads_zero_marks_auto_detected() {
        set_max_threads(3);
        assert!(!is_auto_detected());
        set_max_threads(0);
        assert!(is_auto_detected());
    }

    #[test]
    fn deinit_on_uninitialized_pool_is_a_noop() {
        deinit();
        deinit();
    }

    #[test]
    fn submit_after_deinit_reinitializes() {
        deinit();
        let done = Arc::new(Counter::new(0));
        let latch = CountdownLatch::new(1);
        {
            let done = done.clone();
            let latch = latch.clone();
            submit(Box::new(move || {
                done.fetch_add(1, Ordering::SeqCst);
                latch.count_down();
            }));
        }
        latch.wait();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        deinit();
    }
}
