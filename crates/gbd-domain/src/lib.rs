//! GBD Domain Layer
//!
//! Core vocabulary shared by the instance tools: the [`Extractor`] capability,
//! the [`MemoryScope`] through which extractors account for their memory, and
//! the error types that flow between extractors and the scheduler.
//!
//! ## Key Concepts
//!
//! - **Extractor**: analyzes one instance file and yields a named feature vector
//! - **Memory scope**: per-job accounting handle; a charge may be refused with a
//!   [`TerminationRequest`], which preempts the running job
//! - **Feature record**: feature names paired positionally with their values
//! - **Instance format**: CNF, WCNF, OPB or QBF, detected from the file name
//!
//! ## Architecture
//!
//! This crate performs no I/O and knows nothing about threads. The scheduler
//! (`gbd-pool`) implements [`MemoryScope`]; the concrete analyzers
//! (`gbd-extract`) implement [`Extractor`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use error::{ExtractError, TerminationRequest};
pub use format::{Compression, InstanceFormat};
pub use record::FeatureRecord;
pub use traits::{Extractor, MemoryScope, Untracked};
