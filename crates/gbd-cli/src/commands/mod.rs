//! Command implementations.

pub mod batch;
pub mod extract;
pub mod id;
pub mod transform;

pub use self::batch::execute_batch;
pub use self::extract::execute_extract;
pub use self::id::{execute_hash, execute_id, execute_isohash};
pub use self::transform::{
    execute_check_sanitized, execute_cnf2kis, execute_normalize, execute_sanitize,
};
