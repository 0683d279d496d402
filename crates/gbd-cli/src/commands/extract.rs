//! Extract command implementation.

use crate::cli::{ExtractArgs, ExtractorArg};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gbd_domain::InstanceFormat;
use gbd_extract::{extract_record, CnfBaseFeatures, OpbBaseFeatures, WcnfBaseFeatures};
use std::path::Path;

/// Pick the extractor for `path` from its file name
pub fn detect_extractor(path: &Path) -> Result<ExtractorArg> {
    match InstanceFormat::from_path(path) {
        Some(InstanceFormat::Cnf) => Ok(ExtractorArg::Cnf),
        Some(InstanceFormat::Wcnf) => Ok(ExtractorArg::Wcnf),
        Some(InstanceFormat::Opb) => Ok(ExtractorArg::Opb),
        Some(other) => Err(CliError::InvalidInput(format!(
            "no feature extractor for {} instances",
            other.as_str()
        ))),
        None => Err(CliError::InvalidInput(format!(
            "cannot detect the instance format of {}; use --kind",
            path.display()
        ))),
    }
}

/// Execute the extract command.
pub fn execute_extract(args: ExtractArgs, formatter: &Formatter) -> Result<()> {
    let kind = match args.kind {
        Some(kind) => kind,
        None => detect_extractor(&args.file)?,
    };

    let record = match kind {
        ExtractorArg::Cnf => extract_record::<CnfBaseFeatures>(&args.file)?,
        ExtractorArg::Wcnf => extract_record::<WcnfBaseFeatures>(&args.file)?,
        ExtractorArg::Opb => extract_record::<OpbBaseFeatures>(&args.file)?,
    };
    println!("{}", formatter.record(&args.file, &record)?);
    Ok(())
}
