//! Error types shared by extractors and the scheduler

use thiserror::Error;

/// Forced abort raised from inside a tracked allocation.
///
/// Returned by [`MemoryScope::on_alloc`](crate::MemoryScope::on_alloc) when the
/// pool cannot admit the allocation and this job was chosen for termination.
/// Extractors propagate it unchanged with `?`; the scheduler requeues the job
/// with `needed` as its new memory estimate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Termination requested: allocation of {requested} bytes refused, job needs at least {needed} bytes")]
pub struct TerminationRequest {
    /// Size of the allocation that was refused
    pub requested: usize,
    /// Memory the job is known to need before it can make progress
    pub needed: usize,
}

/// Errors that can occur while extracting features from an instance
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The job was preempted by the memory ledger
    #[error(transparent)]
    Terminated(#[from] TerminationRequest),

    /// I/O error while reading the instance
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed instance content
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number where the problem was detected
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Compression scheme that the reader cannot decode
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Instance format not handled by the requested operation
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ExtractError {
    /// Whether this error is a forced abort (recoverable by requeueing)
    pub fn is_termination(&self) -> bool {
        matches!(self, ExtractError::Terminated(_))
    }

    /// The termination request carried by this error, if any
    pub fn termination(&self) -> Option<TerminationRequest> {
        match self {
            ExtractError::Terminated(request) => Some(*request),
            _ => None,
        }
    }
}
