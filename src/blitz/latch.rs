//! Per-batch countdown latch: the one blocking primitive a `parallel_for`
//! caller waits on.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Inner {
    remaining: AtomicUsize,
    mutex: Mutex<()>,
    condvar: Condvar,
}

/// A single-use, shareable countdown latch. Create one per parallel batch,
/// clone it into every task, call [`CountdownLatch::count_down`] when a task
/// finishes, and [`CountdownLatch::wait`] on the submitting thread.
#[derive(Clone)]
pub struct CountdownLatch {
    inner: Arc<Inner>,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                remaining: AtomicUsize::new(count),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Decrements the count; wakes waiters once it reaches zero.
    pub fn count_down(&self) {
        let prev = self.inner.remaining.fetch_sub(1, Ordering::AcqRel);
        if prev == 1 {
            let _guard = self.inner.mutex.lock();
            self.inner.condvar.notify_all();
        }
    }

    /// Blocks the calling thread until the count reaches zero.
    pub fn wait(&self) {
        if self.inner.remaining.load(Ordering::Acquire) == 0 {
            return;
        }
        let mut guard = self.inner.mutex.lock();
        while self.inner.remaining.load(Ordering::Acquire) != 0 {
            self.inner.condvar.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_returns_immediately_for_zero_count() {
        let latch = CountdownLatch::new(0);
        latch.wait();
    }

    #[test]
    fn wait_blocks_until_all_counted_down() {
        let latch = CountdownLatch::new(4);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let latch = latch.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(5));
                    latch.count_down();
                })
            })
            .collect();
        latch.wait();
        for h in handles {
            h.join().unwrap();
        }
    }
}
