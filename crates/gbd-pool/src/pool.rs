//! Pool construction, start-up and shutdown

use crate::worker::run_worker;
use crate::{
    JobQueue, JobResult, MemoryLedger, PoolConfig, PoolError, PoolMetrics, ResultQueue,
    SizeModel,
};
use gbd_domain::Extractor;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// State shared by all workers of one pool
pub(crate) struct Shared {
    pub(crate) config: PoolConfig,
    pub(crate) ledger: MemoryLedger,
    pub(crate) queue: JobQueue,
    pub(crate) model: SizeModel,
    /// Serializes forced aborts pool-wide
    pub(crate) termination: Mutex<()>,
    pub(crate) terminations: AtomicUsize,
    pub(crate) metrics: Mutex<PoolMetrics>,
}

/// Fixed set of worker threads running extractor `E` over a list of files
///
/// # Examples
///
/// ```no_run
/// use gbd_extract::CnfBaseFeatures;
/// use gbd_pool::{Pool, PoolConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PoolConfig::default().with_mem_max(256 << 20).with_workers(4);
/// let mut pool = Pool::<CnfBaseFeatures>::new(vec!["a.cnf", "b.cnf.gz"], config)?;
/// let results = pool.result_queue();
/// pool.start()?;
///
/// while let Some(result) = results.recv() {
///     println!("{} {}", result.path.display(), result.success);
/// }
/// let metrics = pool.join()?;
/// println!("{}", metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Pool<E: Extractor + 'static> {
    shared: Arc<Shared>,
    results: Arc<ResultQueue>,
    handles: Vec<JoinHandle<()>>,
    started_at: Option<Instant>,
    _extractor: PhantomData<fn() -> E>,
}

impl<E: Extractor + 'static> Pool<E> {
    /// Create a pool over `paths` with the given configuration
    ///
    /// Jobs are queued smallest file first. No thread is spawned until
    /// [`start`](Self::start).
    pub fn new<I, P>(paths: I, config: PoolConfig) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        config.validate().map_err(PoolError::Config)?;

        let queue = JobQueue::from_paths(paths, config.job_buffer_bytes, config.job_limit());
        let shared = Shared {
            ledger: MemoryLedger::new(config.mem_max_bytes),
            queue,
            model: SizeModel::new(),
            termination: Mutex::new(()),
            terminations: AtomicUsize::new(0),
            metrics: Mutex::new(PoolMetrics::new()),
            config,
        };

        Ok(Self {
            results: Arc::new(ResultQueue::new(shared.config.workers)),
            shared: Arc::new(shared),
            handles: Vec::new(),
            started_at: None,
            _extractor: PhantomData,
        })
    }

    /// Create a pool with a memory ceiling and worker count, defaults otherwise
    pub fn with_limits<I, P>(paths: I, mem_max: usize, workers: usize) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(
            paths,
            PoolConfig::default().with_mem_max(mem_max).with_workers(workers),
        )
    }

    /// Feature names of the pool's extractor, aligned with every result's features
    pub fn feature_names() -> Vec<String> {
        E::names()
    }

    /// Handle to the queue results are published on
    ///
    /// Take it before [`start`](Self::start) to consume results as they arrive.
    pub fn result_queue(&self) -> Arc<ResultQueue> {
        Arc::clone(&self.results)
    }

    /// Spawn the workers; may be called once
    pub fn start(&mut self) -> Result<(), PoolError> {
        if self.started_at.is_some() {
            return Err(PoolError::AlreadyStarted);
        }
        self.started_at = Some(Instant::now());

        let workers = self.shared.config.workers;
        tracing::info!(
            "Pool started: {} workers, {} jobs, ceiling {} bytes",
            workers,
            self.shared.queue.len(),
            self.shared.ledger.mem_max()
        );

        for id in 0..workers {
            let shared = Arc::clone(&self.shared);
            let results = Arc::clone(&self.results);
            let spawned = thread::Builder::new()
                .name(format!("gbd-worker-{}", id))
                .spawn(move || run_worker::<E>(id, &shared, &results));

            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    // Slots that never ran must still count as finished producers.
                    for _ in id..workers {
                        self.results.quit();
                    }
                    return Err(PoolError::Worker(format!(
                        "failed to spawn worker {}: {}",
                        id, e
                    )));
                }
            }
        }
        Ok(())
    }

    /// True once every worker stopped and every result has been consumed
    pub fn jobs_completed(&self) -> bool {
        self.started_at.is_some() && self.results.done()
    }

    /// Wait for all workers to stop and return the run's metrics
    ///
    /// Results not yet consumed stay in the result queue.
    pub fn join(&mut self) -> Result<PoolMetrics, PoolError> {
        let started_at = self.started_at.ok_or(PoolError::NotStarted)?;

        let mut panicked = 0;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }

        let mut metrics = self.shared.metrics.lock();
        metrics.peak_reserved = self.shared.ledger.peak_reserved();
        metrics.total_runtime_secs = started_at.elapsed().as_secs_f64();
        tracing::info!(
            "Pool finished: {} completed, {} failed, {} abandoned, {} terminations",
            metrics.completed,
            metrics.failed,
            metrics.abandoned,
            metrics.terminations
        );

        if panicked > 0 {
            return Err(PoolError::Worker(format!("{} worker(s) panicked", panicked)));
        }
        Ok(metrics.clone())
    }

    /// Start, drain every result and join
    pub fn collect(mut self) -> Result<(Vec<JobResult>, PoolMetrics), PoolError> {
        self.start()?;
        let results: Vec<JobResult> = self.results.iter().collect();
        let metrics = self.join()?;
        Ok((results, metrics))
    }

    /// Snapshot of the metrics collected so far
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics.lock().clone()
    }

    /// The pool's memory ledger
    pub fn ledger(&self) -> &MemoryLedger {
        &self.shared.ledger
    }

    /// The pool's configuration
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Jobs not yet taken by a worker
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }
}
