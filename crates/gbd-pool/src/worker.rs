//! Worker loop
//!
//! Each worker runs `DEQUEUE -> WAIT_ADMISSION -> RUNNING` and then either
//! publishes a result or, after a forced abort, settles its memory, requeues
//! the job and backs off before dequeuing again. It stops when the queue is
//! exhausted.

use crate::pool::Shared;
use crate::{JobResult, RequeueOutcome, ResultQueue, WorkerContext};
use gbd_domain::{ExtractError, Extractor, TerminationRequest};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::thread;

/// Calls [`ResultQueue::quit`] when the worker exits, even by panic
struct ProducerGuard<'a>(&'a ResultQueue);

impl Drop for ProducerGuard<'_> {
    fn drop(&mut self) {
        self.0.quit();
    }
}

enum JobOutcome {
    Done(Vec<f64>),
    Terminated(TerminationRequest),
    Failed(String),
}

/// Run one extractor over `path`; the extractor is dropped before returning
fn run_job<E: Extractor>(path: &Path, ctx: &WorkerContext<'_>) -> JobOutcome {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Vec<f64>, ExtractError> {
        let mut extractor = E::new(path);
        extractor.extract(ctx)?;
        Ok(extractor.features())
    }));

    match attempt {
        Ok(Ok(features)) => JobOutcome::Done(features),
        Ok(Err(ExtractError::Terminated(request))) => JobOutcome::Terminated(request),
        Ok(Err(e)) => JobOutcome::Failed(e.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            JobOutcome::Failed(format!("extractor panicked: {}", message))
        }
    }
}

pub(crate) fn run_worker<E: Extractor>(id: usize, shared: &Shared, results: &ResultQueue) {
    let _producer = ProducerGuard(results);
    let span = tracing::debug_span!("worker", id);
    let _enter = span.enter();

    let ctx = WorkerContext::new(
        id,
        &shared.ledger,
        &shared.termination,
        shared.config.admission_poll(),
    );
    tracing::debug!("Worker {} started", id);

    while let Some(mut job) = shared.queue.next() {
        if !job.is_retry() {
            if let Some(predicted) = shared.model.estimate(job.file_size) {
                job.estimate = job.estimate.max(predicted.min(shared.queue.limit()));
            }
        }

        tracing::debug!(
            "Worker {} waiting for admission of {} ({} bytes)",
            id,
            job.path.display(),
            job.estimate
        );
        ctx.admit(job.estimate);

        tracing::debug!("Worker {} running {}", id, job.path.display());
        let outcome = run_job::<E>(&job.path, &ctx);
        let usage = ctx.finish_job();
        if usage.leaked > 0 {
            shared.metrics.lock().record_leak();
        }

        match outcome {
            JobOutcome::Done(features) => {
                ctx.release_termination();
                shared.model.observe(usage.peak, job.file_size);
                tracing::debug!(
                    "Worker {} finished {} (peak {} bytes, {} allocations)",
                    id,
                    job.path.display(),
                    usage.peak,
                    usage.num_allocs
                );
                shared.metrics.lock().record_completion();
                results.push(JobResult::success(job.path, features));
            }
            JobOutcome::Terminated(request) => {
                let total = shared.terminations.fetch_add(1, Ordering::AcqRel) + 1;
                job.raise_estimate(request.needed.max(usage.peak));
                let estimate = job.estimate;

                match shared.queue.requeue(job) {
                    RequeueOutcome::Requeued => {
                        shared.metrics.lock().record_termination(true);
                        tracing::debug!(
                            "Worker {} requeued job with estimate {} bytes",
                            id,
                            estimate
                        );
                    }
                    RequeueOutcome::Abandoned(job) => {
                        {
                            let mut metrics = shared.metrics.lock();
                            metrics.record_termination(false);
                            metrics.record_abandoned();
                        }
                        tracing::warn!(
                            "Abandoning {}: needs {} bytes, at most {} can be reserved for one job",
                            job.path.display(),
                            estimate,
                            shared.queue.limit()
                        );
                        results.push(JobResult::failure(job.path));
                    }
                }

                ctx.release_termination();
                thread::sleep(shared.config.backoff(total));
            }
            JobOutcome::Failed(message) => {
                ctx.release_termination();
                tracing::warn!("Extraction failed for {}: {}", job.path.display(), message);
                shared.metrics.lock().record_failure();
                results.push(JobResult::failure(job.path));
            }
        }
    }

    tracing::debug!("Worker {} stopped", id);
}
