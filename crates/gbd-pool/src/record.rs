//! Per-worker accounting record
//!
//! Plain bookkeeping owned by one worker thread. All arithmetic that decides
//! how much reservation a pending allocation needs lives here; the ledger
//! calls happen in [`WorkerContext`](crate::WorkerContext).

/// Byte counters of the job currently running on one worker
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    /// Bytes currently allocated by the job
    pub allocated: usize,
    /// Bytes this worker currently holds in the ledger
    pub reserved: usize,
    /// Admission hold of the current job; reservation is not released below it
    pub hold: usize,
    /// Highest `allocated` observed during the current job
    pub peak: usize,
    /// Number of tracked allocations during the current job
    pub num_allocs: usize,
    /// Set once the job was chosen for termination; later allocations bypass admission
    pub exception_alloc: bool,
}

impl ThreadRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for an admitted allocation of `size` bytes
    pub fn on_alloc(&mut self, size: usize) {
        self.allocated += size;
        self.num_allocs += 1;
        self.peak = self.peak.max(self.allocated);
    }

    /// Account for `size` freed bytes
    ///
    /// Returns false if `size` exceeds what is recorded as allocated, which
    /// means the accounting is corrupt. The record is left unchanged then.
    #[must_use]
    pub fn on_dealloc(&mut self, size: usize) -> bool {
        match self.allocated.checked_sub(size) {
            Some(rest) => {
                self.allocated = rest;
                true
            }
            None => false,
        }
    }

    /// Reservation that must be obtained before allocating `size` more bytes
    ///
    /// Slack between reserved and allocated is reused first.
    pub fn additional_reserve_needed(&self, size: usize) -> usize {
        self.allocated
            .saturating_add(size)
            .saturating_sub(self.reserved)
    }

    /// Reservation that becomes surplus once `size` bytes are freed
    ///
    /// The admission hold is kept until the job finishes.
    pub fn reserved_but_unneeded(&self, size: usize) -> usize {
        let floor = self.allocated.saturating_sub(size).max(self.hold);
        self.reserved.saturating_sub(floor)
    }

    /// Memory the job has demonstrably needed if `size` more bytes were refused
    pub fn needed_for(&self, size: usize) -> usize {
        self.allocated
            .saturating_add(size)
            .max(self.peak)
            .max(self.reserved)
    }

    /// Record an admission hold that was just reserved in the ledger
    pub fn admit(&mut self, hold: usize) {
        self.hold = hold;
        self.reserved += hold;
    }

    /// Record additional reservation obtained from the ledger
    pub fn inc_reserved(&mut self, size: usize) {
        self.reserved += size;
    }

    /// Record reservation returned to the ledger
    pub fn dec_reserved(&mut self, size: usize) {
        self.reserved = self.reserved.saturating_sub(size);
        self.hold = self.hold.min(self.reserved);
    }

    /// Clear all per-job counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
