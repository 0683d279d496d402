//! GBD Extract
//!
//! Analyzers for combinatorial-problem instance files.
//!
//! # Overview
//!
//! - **Reading**: [`InstanceReader`] streams DIMACS-like text, decompressing
//!   `.gz`, `.xz`, `.lzma` and `.bz2` transparently
//! - **Identification**: [`hash`] computes canonical `gbdhash` values for CNF,
//!   WCNF, OPB and QBF instances, and the renaming-invariant `isohash` of CNF
//! - **Features**: [`CnfBaseFeatures`], [`WcnfBaseFeatures`] and
//!   [`OpbBaseFeatures`] implement
//!   [`Extractor`](gbd_domain::Extractor); their tables live in
//!   [`TrackedVec`]s charged against the job's
//!   [`MemoryScope`](gbd_domain::MemoryScope)
//! - **Transformations**: [`transform`] normalizes and sanitizes CNF files and
//!   reduces them to independent set problems
//!
//! # Example Usage
//!
//! ```no_run
//! use gbd_extract::{extract_record, CnfBaseFeatures};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), gbd_domain::ExtractError> {
//! let record = extract_record::<CnfBaseFeatures>(Path::new("instance.cnf.gz"))?;
//! println!("clauses = {:?}", record.get("clauses"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod lit;
mod reader;
mod tracked;

pub mod features;
pub mod hash;
pub mod transform;

pub use features::{CnfBaseFeatures, OpbBaseFeatures, WcnfBaseFeatures};
pub use lit::Lit;
pub use reader::InstanceReader;
pub use tracked::TrackedVec;

use gbd_domain::{ExtractError, Extractor, FeatureRecord, Untracked};
use std::path::Path;

/// Run extractor `E` over `path` outside any pool and pair names with values
pub fn extract_record<E: Extractor>(path: &Path) -> Result<FeatureRecord, ExtractError> {
    let mut extractor = E::new(path);
    extractor.extract(&Untracked)?;
    Ok(FeatureRecord::new(E::names(), extractor.features()))
}
