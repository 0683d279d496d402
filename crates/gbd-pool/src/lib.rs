//! GBD Pool
//!
//! Job-parallel feature extraction under a hard memory ceiling.
//!
//! # Overview
//!
//! The pool runs one [`Extractor`](gbd_domain::Extractor) per input file on a
//! fixed set of worker threads and is responsible for:
//! - **Admission**: a job starts only once its memory estimate is reserved in
//!   the shared [`MemoryLedger`]
//! - **Live accounting**: every tracked allocation of a running job is charged
//!   through the worker's [`WorkerContext`]
//! - **Preemption**: when an allocation cannot be reserved, one job at a time
//!   is aborted with a [`TerminationRequest`](gbd_domain::TerminationRequest),
//!   requeued with a larger estimate, and the worker backs off
//! - **Reporting**: every job yields exactly one [`JobResult`] on the
//!   [`ResultQueue`]
//!
//! # Architecture
//!
//! ## Worker state machine
//!
//! | State | Leaves when |
//! |-------|-------------|
//! | **Dequeue** | a job is taken, or the queue is empty (worker stops) |
//! | **Wait admission** | the job's estimate is reserved |
//! | **Running** | the extractor returns, or an allocation is refused |
//! | **Publish** | the result is pushed |
//! | **Aborted** | memory is settled, the job is requeued or abandoned, backoff elapsed |
//!
//! The `reserved` counter never exceeds the ceiling. A job is abandoned only
//! when its estimate exceeds what one job may reserve with the pool otherwise
//! idle, so any job that fits alone eventually succeeds.
//!
//! # Usage
//!
//! ```no_run
//! use gbd_extract::CnfBaseFeatures;
//! use gbd_pool::{Pool, PoolConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Pool::<CnfBaseFeatures>::new(
//!     vec!["small.cnf", "large.cnf.gz"],
//!     PoolConfig::default().with_mem_max(32 << 20).with_workers(1),
//! )?;
//! let (results, metrics) = pool.collect()?;
//! for result in results {
//!     println!("{} {:?}", result.path.display(), result.features);
//! }
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [pool]
//! mem_max_bytes = 1073741824
//! workers = 8
//! job_buffer_bytes = 0
//! safety_margin_bytes = 0
//! admission_poll_ms = 100
//! backoff_step_ms = 50
//! backoff_max_ms = 5000
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod ledger;
mod record;
mod context;
mod job;
mod results;
mod metrics;
mod pool;
mod worker;

pub use error::PoolError;
pub use config::PoolConfig;
pub use ledger::MemoryLedger;
pub use record::ThreadRecord;
pub use context::{JobUsage, WorkerContext, EXCEPTION_ALLOC_LIMIT};
pub use job::{Job, JobQueue, RequeueOutcome, SizeModel};
pub use results::{JobResult, ResultQueue};
pub use metrics::PoolMetrics;
pub use pool::Pool;
