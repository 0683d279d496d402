//! Job records, the pending-job queue and the peak-memory size model

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// One instance file to be processed by one extractor run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Path of the instance file
    pub path: PathBuf,
    /// File size in bytes, 0 if it could not be read
    pub file_size: u64,
    /// Memory to reserve before the job may start (bytes)
    ///
    /// Never decreases across retries.
    pub estimate: usize,
    /// Number of forced aborts this job has suffered
    pub terminations: u32,
}

impl Job {
    /// Create a fresh job with the given initial estimate
    pub fn new(path: impl Into<PathBuf>, file_size: u64, estimate: usize) -> Self {
        Self {
            path: path.into(),
            file_size,
            estimate,
            terminations: 0,
        }
    }

    /// Record a forced abort after which the job is known to need `needed` bytes
    pub fn raise_estimate(&mut self, needed: usize) {
        self.estimate = self.estimate.max(needed);
        self.terminations += 1;
    }

    /// Whether the job has been attempted before
    pub fn is_retry(&self) -> bool {
        self.terminations > 0
    }
}

/// Result of handing an aborted job back to the queue
#[derive(Debug, PartialEq, Eq)]
pub enum RequeueOutcome {
    /// The job was appended to the tail of the queue
    Requeued,
    /// The job can never fit and is handed back for failure reporting
    Abandoned(Job),
}

/// Pending jobs, smallest files first, retries at the tail
#[derive(Debug)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    limit: usize,
}

impl JobQueue {
    /// Build a queue from jobs, sorted ascending by file size
    ///
    /// `limit` is the largest estimate a job may carry when requeued.
    pub fn new(mut jobs: Vec<Job>, limit: usize) -> Self {
        jobs.sort_by_key(|job| job.file_size);
        Self {
            jobs: Mutex::new(jobs.into()),
            limit,
        }
    }

    /// Build a queue from paths, reading each file's size
    ///
    /// A file whose metadata cannot be read is queued with size 0; the
    /// extractor reports the actual error when the job runs.
    pub fn from_paths<I, P>(paths: I, initial_estimate: usize, limit: usize) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let jobs = paths
            .into_iter()
            .map(|path| {
                let path = path.into();
                let file_size = match std::fs::metadata(&path) {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        tracing::warn!("Cannot stat {}: {}", path.display(), e);
                        0
                    }
                };
                Job::new(path, file_size, initial_estimate.min(limit))
            })
            .collect();
        Self::new(jobs, limit)
    }

    /// Pop the next pending job; `None` once the queue is exhausted
    pub fn next(&self) -> Option<Job> {
        self.jobs.lock().pop_front()
    }

    /// Append an aborted job to the tail if it can still complete
    pub fn requeue(&self, job: Job) -> RequeueOutcome {
        if job.estimate > self.limit {
            return RequeueOutcome::Abandoned(job);
        }
        self.jobs.lock().push_back(job);
        RequeueOutcome::Requeued
    }

    /// Number of pending jobs
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether no jobs are pending
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Largest estimate accepted on requeue
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Learned ratio of peak job memory to input file size
///
/// Small files run first, so the ratio is known before the large ones start.
#[derive(Debug, Default)]
pub struct SizeModel {
    // f64 bits; 0.0 until the first observation
    coefficient: AtomicU64,
}

impl SizeModel {
    /// Create an untrained model
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bytes-per-input-byte coefficient, 0 if untrained
    pub fn coefficient(&self) -> f64 {
        f64::from_bits(self.coefficient.load(Ordering::Acquire))
    }

    /// Fold the peak of a successful job into the coefficient
    ///
    /// The first sample is taken as is; later samples are averaged with the
    /// running value.
    pub fn observe(&self, peak: usize, file_size: u64) {
        if file_size == 0 {
            return;
        }
        let sample = peak as f64 / file_size as f64;
        let _ = self
            .coefficient
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let current = f64::from_bits(bits);
                let next = if current == 0.0 {
                    sample
                } else {
                    (sample + current) / 2.0
                };
                Some(next.to_bits())
            });
    }

    /// Predicted peak for a file of `file_size` bytes, if trained
    pub fn estimate(&self, file_size: u64) -> Option<usize> {
        let coefficient = self.coefficient();
        if coefficient <= 0.0 {
            return None;
        }
        Some((coefficient * file_size as f64) as usize)
    }
}
