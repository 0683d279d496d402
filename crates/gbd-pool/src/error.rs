//! Error types for pool operations

use thiserror::Error;

/// Errors that can occur while constructing or driving a [`Pool`](crate::Pool)
///
/// Per-job failures are not errors at this level: they are reported through
/// the result queue with `success == false`.
#[derive(Error, Debug)]
pub enum PoolError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// `start()` was called on a pool that is already running
    #[error("Pool already started")]
    AlreadyStarted,

    /// An operation that needs running workers was called before `start()`
    #[error("Pool not started")]
    NotStarted,

    /// Worker error (spawn failure or panic)
    #[error("Worker error: {0}")]
    Worker(String),
}
