//! Batch command implementation.

use crate::cli::{BatchArgs, ExtractorArg};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gbd_domain::Extractor;
use gbd_extract::{CnfBaseFeatures, OpbBaseFeatures, WcnfBaseFeatures};
use gbd_pool::{Pool, PoolConfig, PoolMetrics};
use std::io::{self, Write};

const MIB: usize = 1 << 20;

/// Pool configuration from the config file, overridden by command-line flags
pub fn pool_config(args: &BatchArgs, config: &Config) -> Result<PoolConfig> {
    let mut pool = config.pool.clone();
    if let Some(mem_max) = args.mem_max {
        pool = pool.with_mem_max(mem_max.saturating_mul(MIB));
    }
    if let Some(jobs) = args.jobs {
        pool = pool.with_workers(jobs);
    }
    pool.validate().map_err(CliError::InvalidInput)?;
    Ok(pool)
}

/// Execute the batch command.
///
/// Results are printed as they arrive; the metrics summary goes to stderr.
pub fn execute_batch(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pool_config = pool_config(&args, config)?;
    let mut out = io::stdout().lock();

    let metrics = match args.kind {
        ExtractorArg::Cnf => run::<CnfBaseFeatures, _>(args.files, pool_config, formatter, &mut out)?,
        ExtractorArg::Wcnf => run::<WcnfBaseFeatures, _>(args.files, pool_config, formatter, &mut out)?,
        ExtractorArg::Opb => run::<OpbBaseFeatures, _>(args.files, pool_config, formatter, &mut out)?,
    };

    eprintln!("{}", metrics.summary());
    match metrics.total_unsuccessful() {
        0 => Ok(()),
        failed => Err(CliError::JobsFailed(failed)),
    }
}

/// Run a pool with extractor `E` and stream its results to `out`
pub fn run<E, W>(
    files: Vec<std::path::PathBuf>,
    config: PoolConfig,
    formatter: &Formatter,
    out: &mut W,
) -> Result<PoolMetrics>
where
    E: Extractor + 'static,
    W: Write,
{
    let names = Pool::<E>::feature_names();
    let mut pool = Pool::<E>::new(files, config)?;
    let results = pool.result_queue();
    pool.start()?;

    if let Some(header) = formatter.batch_header(&names) {
        writeln!(out, "{}", header)?;
    }
    while let Some(result) = results.recv() {
        writeln!(out, "{}", formatter.job_result(&result, &names)?)?;
        out.flush()?;
    }

    Ok(pool.join()?)
}
