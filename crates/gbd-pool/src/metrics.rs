//! Metrics collected over a pool run

/// Counters describing one pool run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolMetrics {
    /// Jobs that produced a feature vector
    pub completed: usize,

    /// Jobs that failed with a non-memory error
    pub failed: usize,

    /// Jobs abandoned because they cannot fit even alone
    pub abandoned: usize,

    /// Forced aborts across all jobs
    pub terminations: usize,

    /// Aborted jobs that went back to the queue
    pub requeued: usize,

    /// Extractors that left tracked memory allocated
    pub leaks: usize,

    /// Highest pool-wide reservation observed (bytes)
    pub peak_reserved: usize,

    /// Total runtime in seconds
    pub total_runtime_secs: f64,
}

impl PoolMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful job
    pub fn record_completion(&mut self) {
        self.completed += 1;
    }

    /// Record a job that failed on its own input
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Record a job that was given up on for lack of memory
    pub fn record_abandoned(&mut self) {
        self.abandoned += 1;
    }

    /// Record a forced abort and whether the job was requeued afterwards
    pub fn record_termination(&mut self, requeued: bool) {
        self.terminations += 1;
        if requeued {
            self.requeued += 1;
        }
    }

    /// Record an extractor that leaked tracked memory
    pub fn record_leak(&mut self) {
        self.leaks += 1;
    }

    /// Jobs that reported a result, either way
    pub fn total_reported(&self) -> usize {
        self.completed + self.failed + self.abandoned
    }

    /// Jobs that reported `success == false`
    pub fn total_unsuccessful(&self) -> usize {
        self.failed + self.abandoned
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pool Metrics Summary".to_string(),
            "====================".to_string(),
            format!("Completed: {}", self.completed),
            format!("Failed: {}", self.failed),
            format!("Abandoned: {}", self.abandoned),
            format!("Total runtime: {:.2}s", self.total_runtime_secs),
        ];

        if self.terminations > 0 {
            lines.push(String::new());
            lines.push(format!(
                "Terminations: {} ({} requeued)",
                self.terminations, self.requeued
            ));
        }

        if self.leaks > 0 {
            lines.push(format!("Leaking extractor runs: {}", self.leaks));
        }

        lines.push(format!(
            "Peak reserved: {:.1} MiB",
            self.peak_reserved as f64 / (1u64 << 20) as f64
        ));

        lines.join("\n")
    }
}
