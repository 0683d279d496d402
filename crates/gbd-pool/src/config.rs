//! Configuration for the extraction pool
//!
//! Defines the memory ceiling, worker count, per-job buffers and the timing of
//! admission polling and termination backoff (linear, capped).

use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIB: usize = 1 << 20;

/// Configuration for a [`Pool`](crate::Pool)
///
/// # Examples
///
/// ```
/// use gbd_pool::PoolConfig;
///
/// // Default configuration (1 GiB ceiling, one worker per core)
/// let config = PoolConfig::default();
/// assert_eq!(config.mem_max_bytes, 1 << 30);
///
/// // Conservative: keeps a safety margin below the ceiling
/// let config = PoolConfig::conservative();
/// assert!(config.safety_margin_bytes > 0);
///
/// // Explicit ceiling and worker count
/// let config = PoolConfig::default().with_mem_max(32 << 20).with_workers(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Hard ceiling on the memory all running jobs may reserve together (bytes)
    /// Default: 1 GiB
    pub mem_max_bytes: usize,

    /// Number of worker threads, i.e. jobs that may run in parallel
    /// Default: available parallelism
    pub workers: usize,

    /// Initial memory estimate for a job that has never run (bytes)
    /// Default: 0 (jobs start without a hold and grow on demand)
    #[serde(default)]
    pub job_buffer_bytes: usize,

    /// Headroom below the ceiling that a single job's estimate may not enter (bytes)
    /// A job whose estimate exceeds `mem_max_bytes - safety_margin_bytes` is abandoned.
    /// Default: 0
    #[serde(default)]
    pub safety_margin_bytes: usize,

    /// Upper bound on a single wait for released memory (milliseconds)
    /// Default: 100
    #[serde(default = "default_admission_poll_ms")]
    pub admission_poll_ms: u64,

    /// Backoff per pool-wide termination, applied after each forced abort (milliseconds)
    /// Default: 50
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Upper bound on a single backoff, however many terminations occurred (milliseconds)
    /// Default: 5000
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_admission_poll_ms() -> u64 {
    100
}

fn default_backoff_step_ms() -> u64 {
    50
}

fn default_backoff_max_ms() -> u64 {
    5_000
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mem_max_bytes: 1 << 30,
            workers: default_workers(),
            job_buffer_bytes: 0,
            safety_margin_bytes: 0,
            admission_poll_ms: default_admission_poll_ms(),
            backoff_step_ms: default_backoff_step_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl PoolConfig {
    /// Conservative preset: buffered estimates, a safety margin, slower backoff
    ///
    /// Fewer forced aborts at the price of less parallelism.
    ///
    /// - Job buffer: 10 MiB
    /// - Safety margin: 5 MiB
    /// - Backoff step: 100 ms
    pub fn conservative() -> Self {
        Self {
            job_buffer_bytes: 10 * MIB,
            safety_margin_bytes: 5 * MIB,
            backoff_step_ms: 100,
            ..Self::default()
        }
    }

    /// Throughput preset: no buffers, fast polling, short backoff
    ///
    /// Admits jobs as early as possible and relies on preemption to resolve
    /// memory pressure.
    pub fn throughput() -> Self {
        Self {
            job_buffer_bytes: 0,
            safety_margin_bytes: 0,
            admission_poll_ms: 10,
            backoff_step_ms: 10,
            ..Self::default()
        }
    }

    /// Set the memory ceiling in bytes
    pub fn with_mem_max(mut self, bytes: usize) -> Self {
        self.mem_max_bytes = bytes;
        self
    }

    /// Set the number of worker threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Largest estimate a single job may carry and still be (re)queued
    pub fn job_limit(&self) -> usize {
        self.mem_max_bytes.saturating_sub(self.safety_margin_bytes)
    }

    /// Get the admission poll interval as Duration
    pub fn admission_poll(&self) -> Duration {
        Duration::from_millis(self.admission_poll_ms)
    }

    /// Get the backoff step as Duration
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    /// Backoff after the `terminations`-th pool-wide termination
    ///
    /// Grows linearly with `terminations` and saturates at `backoff_max_ms`.
    pub fn backoff(&self, terminations: usize) -> Duration {
        let penalty = u32::try_from(terminations).unwrap_or(u32::MAX);
        self.backoff_step()
            .saturating_mul(penalty)
            .min(Duration::from_millis(self.backoff_max_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.mem_max_bytes == 0 {
            return Err("mem_max_bytes must be greater than 0".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.safety_margin_bytes >= self.mem_max_bytes {
            return Err("safety_margin_bytes must be smaller than mem_max_bytes".to_string());
        }
        if self.job_buffer_bytes > self.job_limit() {
            return Err("job_buffer_bytes cannot exceed mem_max_bytes - safety_margin_bytes".to_string());
        }
        if self.admission_poll_ms == 0 {
            return Err("admission_poll_ms must be greater than 0".to_string());
        }
        if self.backoff_max_ms < self.backoff_step_ms {
            return Err("backoff_max_ms cannot be smaller than backoff_step_ms".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
