//! Normalize, sanitize, check-sanitized and cnf2kis command implementations.

use crate::cli::{FileArgs, KisArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gbd_extract::transform::{self, KisLimits};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

/// Execute the normalize command.
pub fn execute_normalize(args: FileArgs) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    transform::normalize(&args.file, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Execute the sanitize command.
pub fn execute_sanitize(args: FileArgs) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    let removed = transform::sanitize(&args.file, &mut out)?;
    out.flush()?;
    tracing::info!("Removed {} clause(s) from {}", removed, args.file.display());
    Ok(())
}

/// Execute the check-sanitized command.
pub fn execute_check_sanitized(args: FileArgs, formatter: &Formatter) -> Result<()> {
    let sanitized = transform::check_sanitized(&args.file)?;
    println!("{}", formatter.sanitized(&args.file, sanitized)?);
    Ok(())
}

/// Execute the cnf2kis command.
///
/// An output file that would exceed the limits is removed again.
pub fn execute_cnf2kis(args: KisArgs) -> Result<()> {
    let limits = KisLimits {
        max_edges: args.max_edges,
        max_nodes: args.max_nodes,
    };
    let report = match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let report = transform::cnf2kis(&args.file, limits, &mut out)?;
            out.flush()?;
            if !report.generated {
                drop(out);
                fs::remove_file(path)?;
            }
            report
        }
        None => {
            let mut out = BufWriter::new(io::stdout().lock());
            let report = transform::cnf2kis(&args.file, limits, &mut out)?;
            out.flush()?;
            report
        }
    };

    if !report.generated {
        return Err(CliError::LimitExceeded(format!(
            "{} has {} nodes and {} edges",
            args.file.display(),
            report.nodes,
            report.edges
        )));
    }
    tracing::info!(
        "Reduced {} to {} nodes, {} edges, k = {}",
        args.file.display(),
        report.nodes,
        report.edges,
        report.k
    );
    Ok(())
}
