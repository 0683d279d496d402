//! Result queue between the workers and the caller
//!
//! Many producers (the workers) push, one consumer pops. The queue tracks how
//! many producers are still alive, so the consumer can tell "empty for now"
//! apart from "finished".

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of one job
///
/// A failed job always carries an empty feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    /// Path of the instance file
    pub path: PathBuf,
    /// Feature values, aligned with the extractor's names
    pub features: Vec<f64>,
    /// Whether extraction completed
    pub success: bool,
}

impl JobResult {
    /// Result of a completed extraction
    pub fn success(path: PathBuf, features: Vec<f64>) -> Self {
        Self {
            path,
            features,
            success: true,
        }
    }

    /// Result of a job that failed or was abandoned
    pub fn failure(path: PathBuf) -> Self {
        Self {
            path,
            features: Vec::new(),
            success: false,
        }
    }
}

/// Multi-producer, single-consumer queue of [`JobResult`]s
#[derive(Debug)]
pub struct ResultQueue {
    items: Mutex<VecDeque<JobResult>>,
    producers: AtomicUsize,
    changed: Condvar,
}

impl ResultQueue {
    /// Create a queue expecting `producers` live producers
    pub fn new(producers: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            producers: AtomicUsize::new(producers),
            changed: Condvar::new(),
        }
    }

    /// Append a result
    pub fn push(&self, item: JobResult) {
        let mut items = self.items.lock();
        items.push_back(item);
        self.changed.notify_one();
    }

    /// Take the oldest result without blocking
    pub fn pop(&self) -> Option<JobResult> {
        self.items.lock().pop_front()
    }

    /// Whether no results are waiting right now
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of results waiting
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Signal that one producer has finished
    pub fn quit(&self) {
        let items = self.items.lock();
        let _ = self
            .producers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| p.checked_sub(1));
        drop(items);
        self.changed.notify_all();
    }

    /// Producers that have not called [`quit`](Self::quit) yet
    pub fn producers(&self) -> usize {
        self.producers.load(Ordering::Acquire)
    }

    /// True once all producers have quit and every result has been taken
    pub fn done(&self) -> bool {
        let items = self.items.lock();
        items.is_empty() && self.producers() == 0
    }

    /// Block until a result is available; `None` once the queue is done
    pub fn recv(&self) -> Option<JobResult> {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.producers() == 0 {
                return None;
            }
            self.changed.wait(&mut items);
        }
    }

    /// Drain results until the queue is done
    pub fn iter(&self) -> impl Iterator<Item = JobResult> + '_ {
        std::iter::from_fn(move || self.recv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn result(name: &str) -> JobResult {
        JobResult::success(PathBuf::from(name), vec![1.0])
    }

    #[test]
    fn test_done_requires_quit_and_drain() {
        let queue = ResultQueue::new(2);
        assert!(!queue.done());
        queue.push(result("a"));
        queue.quit();
        queue.quit();
        assert!(!queue.done());
        assert_eq!(queue.pop().unwrap().path, PathBuf::from("a"));
        assert!(queue.done());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_quit_does_not_underflow() {
        let queue = ResultQueue::new(1);
        queue.quit();
        queue.quit();
        assert_eq!(queue.producers(), 0);
        assert!(queue.done());
    }

    #[test]
    fn test_failure_has_no_features() {
        let failed = JobResult::failure(PathBuf::from("x"));
        assert!(!failed.success);
        assert!(failed.features.is_empty());
    }

    #[test]
    fn test_recv_across_threads() {
        let queue = ResultQueue::new(3);

        let received: Vec<JobResult> = thread::scope(|s| {
            for t in 0..3 {
                let queue = &queue;
                s.spawn(move || {
                    for i in 0..50 {
                        queue.push(result(&format!("{}-{}", t, i)));
                    }
                    queue.quit();
                });
            }
            queue.iter().collect()
        });

        assert_eq!(received.len(), 150);
        assert!(queue.done());
    }
}
