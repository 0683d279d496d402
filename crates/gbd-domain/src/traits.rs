//! Trait definitions for the extraction boundary
//!
//! These traits define the seam between the scheduler and the analyzers.
//! Implementations live in other crates.

use crate::{ExtractError, TerminationRequest};
use std::path::Path;

/// Accounting handle for the memory a single job allocates
///
/// Implemented by the scheduler (gbd-pool), one per worker. Extractors report
/// every tracked allocation and free through it. `on_alloc` may refuse with a
/// [`TerminationRequest`], which the extractor must propagate.
///
/// The handle is only ever used from the worker thread that owns it, so
/// implementations use interior mutability behind `&self`.
pub trait MemoryScope {
    /// Account for `bytes` about to be allocated
    fn on_alloc(&self, bytes: usize) -> Result<(), TerminationRequest>;

    /// Account for `bytes` that were freed
    fn on_dealloc(&self, bytes: usize);
}

/// Scope that accepts every allocation without accounting
///
/// Used by the single-file entry points, which run outside a pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct Untracked;

impl MemoryScope for Untracked {
    fn on_alloc(&self, _bytes: usize) -> Result<(), TerminationRequest> {
        Ok(())
    }

    fn on_dealloc(&self, _bytes: usize) {}
}

/// Trait for extracting a feature vector from one instance file
///
/// Implemented by the analyzers (gbd-extract). Constructing an extractor must
/// be cheap and infallible; opening and reading the file happens in
/// [`Extractor::extract`].
pub trait Extractor {
    /// Create an extractor bound to the instance at `path`
    fn new(path: &Path) -> Self
    where
        Self: Sized;

    /// Names of the features this extractor produces, in output order
    fn names() -> Vec<String>
    where
        Self: Sized;

    /// Run the analysis, accounting tracked memory against `scope`
    fn extract(&mut self, scope: &dyn MemoryScope) -> Result<(), ExtractError>;

    /// Extracted feature values, aligned with [`Extractor::names`]
    fn features(&self) -> Vec<f64>;
}
