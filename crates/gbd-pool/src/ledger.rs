//! Pool-wide memory ledger
//!
//! The ledger owns the single piece of hot shared state: the `reserved`
//! counter. It is updated with a compare-and-swap loop and never exceeds the
//! configured ceiling. Releases bump an epoch and wake waiters, so admission
//! waits block on a condition variable instead of polling blindly.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Shared memory budget for all workers of a pool
#[derive(Debug)]
pub struct MemoryLedger {
    mem_max: usize,
    reserved: AtomicUsize,
    allocated: AtomicUsize,
    peak_reserved: AtomicUsize,
    epoch: AtomicU64,
    lock: Mutex<()>,
    released: Condvar,
}

impl MemoryLedger {
    /// Create a ledger with the given ceiling in bytes
    pub fn new(mem_max: usize) -> Self {
        Self {
            mem_max,
            reserved: AtomicUsize::new(0),
            allocated: AtomicUsize::new(0),
            peak_reserved: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
            lock: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    /// Try to move `size` bytes from free into reserved
    ///
    /// Commits only if `reserved + size <= mem_max`. Never blocks.
    pub fn reserve(&self, size: usize) -> bool {
        if size == 0 {
            return true;
        }

        let mut current = self.reserved.load(Ordering::Acquire);
        loop {
            let next = match current.checked_add(size) {
                Some(next) if next <= self.mem_max => next,
                _ => return false,
            };
            match self.reserved.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak_reserved.fetch_max(next, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Return `size` reserved bytes to the free pool and wake waiters
    ///
    /// Saturates at zero rather than wrapping.
    pub fn unreserve(&self, size: usize) {
        if size == 0 {
            return;
        }

        let mut current = self.reserved.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(size);
            match self.reserved.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let _guard = self.lock.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.released.notify_all();
    }

    /// Release counter, incremented on every `unreserve`
    ///
    /// Read it before a failed `reserve` and pass it to
    /// [`wait_for_release`](Self::wait_for_release) so that a release racing
    /// with the failed attempt is not missed.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Block until some memory is released after `epoch`, or `timeout` elapses
    ///
    /// Returns true if a release was observed.
    pub fn wait_for_release(&self, epoch: u64, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if self.epoch.load(Ordering::Acquire) != epoch {
            return true;
        }
        let _ = self.released.wait_for(&mut guard, timeout);
        self.epoch.load(Ordering::Acquire) != epoch
    }

    /// Record bytes allocated by some worker (informational)
    pub fn note_alloc(&self, size: usize) {
        self.allocated.fetch_add(size, Ordering::Relaxed);
    }

    /// Record bytes freed by some worker (informational)
    pub fn note_dealloc(&self, size: usize) {
        let _ = self
            .allocated
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |a| {
                Some(a.saturating_sub(size))
            });
    }

    /// Configured ceiling in bytes
    pub fn mem_max(&self) -> usize {
        self.mem_max
    }

    /// Bytes currently reserved
    pub fn reserved(&self) -> usize {
        self.reserved.load(Ordering::Acquire)
    }

    /// Bytes that can still be reserved
    pub fn available(&self) -> usize {
        self.mem_max.saturating_sub(self.reserved())
    }

    /// Bytes currently allocated across all workers, as reported by them
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Highest value `reserved` has reached
    pub fn peak_reserved(&self) -> usize {
        self.peak_reserved.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_reserve_respects_ceiling() {
        let ledger = MemoryLedger::new(100);
        assert!(ledger.reserve(60));
        assert!(!ledger.reserve(41));
        assert!(ledger.reserve(40));
        assert_eq!(ledger.reserved(), 100);
        assert_eq!(ledger.available(), 0);
        assert!(!ledger.reserve(1));
        assert!(ledger.reserve(0));
    }

    #[test]
    fn test_reserve_overflow_is_refused() {
        let ledger = MemoryLedger::new(usize::MAX);
        assert!(ledger.reserve(10));
        assert!(!ledger.reserve(usize::MAX));
        assert_eq!(ledger.reserved(), 10);
    }

    #[test]
    fn test_unreserve_saturates() {
        let ledger = MemoryLedger::new(100);
        assert!(ledger.reserve(30));
        ledger.unreserve(50);
        assert_eq!(ledger.reserved(), 0);
        assert_eq!(ledger.peak_reserved(), 30);
    }

    #[test]
    fn test_unreserve_bumps_epoch() {
        let ledger = MemoryLedger::new(100);
        let before = ledger.epoch();
        ledger.unreserve(0);
        assert_eq!(ledger.epoch(), before);
        ledger.unreserve(1);
        assert_eq!(ledger.epoch(), before + 1);
    }

    #[test]
    fn test_wait_returns_immediately_on_stale_epoch() {
        let ledger = MemoryLedger::new(100);
        let epoch = ledger.epoch();
        ledger.unreserve(10);
        let start = Instant::now();
        assert!(ledger.wait_for_release(epoch, Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_times_out_without_release() {
        let ledger = MemoryLedger::new(100);
        let epoch = ledger.epoch();
        assert!(!ledger.wait_for_release(epoch, Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_wakes_on_release_from_other_thread() {
        let ledger = Arc::new(MemoryLedger::new(100));
        assert!(ledger.reserve(100));
        let epoch = ledger.epoch();

        let releaser = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                ledger.unreserve(100);
            })
        };

        assert!(ledger.wait_for_release(epoch, Duration::from_secs(10)));
        assert!(ledger.reserve(50));
        releaser.join().unwrap();
    }

    #[test]
    fn test_allocated_counter() {
        let ledger = MemoryLedger::new(100);
        ledger.note_alloc(40);
        ledger.note_alloc(2);
        ledger.note_dealloc(12);
        assert_eq!(ledger.allocated(), 30);
        ledger.note_dealloc(100);
        assert_eq!(ledger.allocated(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_reserved_never_exceeds_ceiling(
            mem_max in 1usize..10_000,
            sizes in prop::collection::vec(prop::collection::vec(0usize..4_000, 1..64), 2..6),
        ) {
            let ledger = MemoryLedger::new(mem_max);

            thread::scope(|s| {
                for thread_sizes in &sizes {
                    let ledger = &ledger;
                    s.spawn(move || {
                        let mut held = Vec::new();
                        for &size in thread_sizes {
                            if ledger.reserve(size) {
                                held.push(size);
                            }
                            assert!(ledger.reserved() <= ledger.mem_max());
                            if held.len() > 2 {
                                ledger.unreserve(held.remove(0));
                            }
                        }
                        for size in held {
                            ledger.unreserve(size);
                        }
                    });
                }
            });

            prop_assert_eq!(ledger.reserved(), 0);
            prop_assert!(ledger.peak_reserved() <= mem_max);
        }
    }
}
