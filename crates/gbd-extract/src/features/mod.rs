//! Feature extractors
//!
//! Every extractor keeps its per-variable and per-clause tables in
//! [`TrackedVec`](crate::TrackedVec)s, so a pool can preempt it from inside
//! any allocation.

mod common;
mod cnf;
mod opb;
mod wcnf;
pub mod stats;

pub use cnf::CnfBaseFeatures;
pub use opb::OpbBaseFeatures;
pub use wcnf::WcnfBaseFeatures;
