//! Worker context: the pool's implementation of [`MemoryScope`]
//!
//! One context exists per worker thread. It binds the worker's
//! [`ThreadRecord`] to the shared [`MemoryLedger`] and decides, on every
//! tracked allocation, whether to proceed, wait for released memory, or
//! preempt the running job.

use crate::{MemoryLedger, ThreadRecord};
use gbd_domain::{MemoryScope, TerminationRequest};
use parking_lot::{Mutex, MutexGuard};
use std::cell::RefCell;
use std::time::Duration;

/// Largest allocation served while a job is unwinding after a termination
pub const EXCEPTION_ALLOC_LIMIT: usize = 10_000;

/// Log an internal accounting violation and abort the process
///
/// Used only for states that indicate a memory-safety bug, never for bad input.
#[cold]
pub(crate) fn fatal(message: &str) -> ! {
    tracing::error!("Fatal accounting violation: {}", message);
    std::process::abort()
}

/// Memory usage of a finished or aborted job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobUsage {
    /// Highest number of bytes allocated at once
    pub peak: usize,
    /// Number of tracked allocations
    pub num_allocs: usize,
    /// Bytes still allocated when the job ended
    pub leaked: usize,
}

/// Per-worker accounting handle passed into every extraction
pub struct WorkerContext<'a> {
    id: usize,
    ledger: &'a MemoryLedger,
    termination: &'a Mutex<()>,
    poll: Duration,
    record: RefCell<ThreadRecord>,
    termination_guard: RefCell<Option<MutexGuard<'a, ()>>>,
}

impl<'a> WorkerContext<'a> {
    /// Create the context of worker `id`
    ///
    /// `termination` is the pool-wide lock that serializes forced aborts;
    /// `poll` bounds each wait for released memory.
    pub fn new(
        id: usize,
        ledger: &'a MemoryLedger,
        termination: &'a Mutex<()>,
        poll: Duration,
    ) -> Self {
        Self {
            id,
            ledger,
            termination,
            poll,
            record: RefCell::new(ThreadRecord::new()),
            termination_guard: RefCell::new(None),
        }
    }

    /// Worker index
    pub fn id(&self) -> usize {
        self.id
    }

    /// Snapshot of the accounting record
    pub fn record(&self) -> ThreadRecord {
        self.record.borrow().clone()
    }

    /// Block until the ledger admits `estimate` bytes for the next job
    ///
    /// Never gives up: a job waits for memory instead of failing on contention.
    pub fn admit(&self, estimate: usize) {
        let estimate = estimate.min(self.ledger.mem_max());
        loop {
            let epoch = self.ledger.epoch();
            if self.ledger.reserve(estimate) {
                self.record.borrow_mut().admit(estimate);
                return;
            }
            tracing::trace!(
                "Worker {} waiting for admission of {} bytes ({} available)",
                self.id,
                estimate,
                self.ledger.available()
            );
            self.ledger.wait_for_release(epoch, self.poll);
        }
    }

    /// Settle the ledger after a job ended, successfully or not
    ///
    /// Returns the remaining reservation to the ledger and clears the record.
    pub fn finish_job(&self) -> JobUsage {
        let mut record = self.record.borrow_mut();
        let usage = JobUsage {
            peak: record.peak,
            num_allocs: record.num_allocs,
            leaked: record.allocated,
        };

        if usage.leaked > 0 {
            tracing::warn!(
                "Worker {}: extractor left {} bytes allocated after the job ended",
                self.id,
                usage.leaked
            );
            self.ledger.note_dealloc(usage.leaked);
        }

        self.ledger.unreserve(record.reserved);
        record.reset();
        usage
    }

    /// Whether this worker currently owns the pool-wide termination lock
    pub fn holds_termination(&self) -> bool {
        self.termination_guard.borrow().is_some()
    }

    /// Release the termination lock if this worker holds it
    ///
    /// Returns true if the lock was held.
    pub fn release_termination(&self) -> bool {
        self.termination_guard.borrow_mut().take().is_some()
    }
}

impl MemoryScope for WorkerContext<'_> {
    fn on_alloc(&self, bytes: usize) -> Result<(), TerminationRequest> {
        let mut record = self.record.borrow_mut();

        if record.exception_alloc {
            if bytes > EXCEPTION_ALLOC_LIMIT {
                return Err(TerminationRequest {
                    requested: bytes,
                    needed: record.needed_for(bytes),
                });
            }
            record.on_alloc(bytes);
            self.ledger.note_alloc(bytes);
            return Ok(());
        }

        loop {
            let extra = record.additional_reserve_needed(bytes);
            let epoch = self.ledger.epoch();
            if self.ledger.reserve(extra) {
                record.inc_reserved(extra);
                break;
            }

            if let Some(guard) = self.termination.try_lock() {
                *self.termination_guard.borrow_mut() = Some(guard);
                record.exception_alloc = true;
                let request = TerminationRequest {
                    requested: bytes,
                    needed: record.needed_for(bytes),
                };
                tracing::warn!(
                    "Worker {}: terminating job (allocated {}, reserved {}, refused {} bytes, {} of {} bytes reserved pool-wide)",
                    self.id,
                    record.allocated,
                    record.reserved,
                    bytes,
                    self.ledger.reserved(),
                    self.ledger.mem_max()
                );
                return Err(request);
            }

            self.ledger.wait_for_release(epoch, self.poll);
        }

        record.on_alloc(bytes);
        self.ledger.note_alloc(bytes);
        if record.allocated > self.ledger.mem_max() {
            fatal(&format!(
                "worker {} allocated {} bytes, above the ceiling of {}",
                self.id,
                record.allocated,
                self.ledger.mem_max()
            ));
        }
        Ok(())
    }

    fn on_dealloc(&self, bytes: usize) {
        let mut record = self.record.borrow_mut();
        let surplus = record.reserved_but_unneeded(bytes);
        if !record.on_dealloc(bytes) {
            fatal(&format!(
                "worker {} freed {} bytes but only {} are recorded as allocated",
                self.id, bytes, record.allocated
            ));
        }
        self.ledger.note_dealloc(bytes);
        record.dec_reserved(surplus);
        self.ledger.unreserve(surplus);
    }
}
