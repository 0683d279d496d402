//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction, hashing or transformation error
    #[error(transparent)]
    Extract(#[from] gbd_domain::ExtractError),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(#[from] gbd_pool::PoolError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A transformation would exceed its size limits
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// Some batch jobs did not produce features
    #[error("{0} job(s) failed")]
    JobsFailed(usize),
}
