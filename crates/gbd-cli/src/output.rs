//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use gbd_domain::FeatureRecord;
use gbd_pool::JobResult;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    header: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, header: bool) -> Self {
        Self { format, header }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the hash of one file.
    pub fn hash(&self, path: &Path, hash: &str) -> Result<String> {
        match self.format {
            OutputFormat::Plain => Ok(hash.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string(&json!({
                "path": path.display().to_string(),
                "hash": hash,
            }))?),
            OutputFormat::Csv => Ok(format!("{},{}", csv_field(&path.display().to_string()), hash)),
        }
    }

    /// Format the features of one file.
    pub fn record(&self, path: &Path, record: &FeatureRecord) -> Result<String> {
        match self.format {
            OutputFormat::Plain => Ok(record
                .pairs()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Json => {
                let features: Map<String, Value> = record
                    .pairs()
                    .map(|(name, value)| (name.to_string(), json!(value)))
                    .collect();
                Ok(serde_json::to_string(&json!({
                    "path": path.display().to_string(),
                    "features": features,
                }))?)
            }
            OutputFormat::Csv => {
                let mut lines = Vec::new();
                if let Some(header) = self.batch_header(&record.names) {
                    lines.push(header);
                }
                lines.push(self.csv_row(path, true, &record.values));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Header line for batch output, if the format has one.
    pub fn batch_header(&self, names: &[String]) -> Option<String> {
        if self.format != OutputFormat::Csv || !self.header {
            return None;
        }
        let mut columns = vec!["path".to_string(), "success".to_string()];
        columns.extend(names.iter().map(|name| csv_field(name)));
        Some(columns.join(","))
    }

    /// Format one batch result.
    ///
    /// Failed jobs keep their columns in CSV, with empty values.
    pub fn job_result(&self, result: &JobResult, names: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Plain => {
                if !result.success {
                    return Ok(format!("{} failed", result.path.display()));
                }
                let values: Vec<String> = result.features.iter().map(|v| v.to_string()).collect();
                Ok(format!("{} {}", result.path.display(), values.join(" ")))
            }
            OutputFormat::Json => {
                let features: Map<String, Value> = names
                    .iter()
                    .zip(&result.features)
                    .map(|(name, value)| (name.clone(), json!(value)))
                    .collect();
                Ok(serde_json::to_string(&json!({
                    "path": result.path.display().to_string(),
                    "success": result.success,
                    "features": features,
                }))?)
            }
            OutputFormat::Csv => {
                if result.success {
                    Ok(self.csv_row(&result.path, true, &result.features))
                } else {
                    let empty = vec![String::new(); names.len()];
                    Ok(format!(
                        "{},false,{}",
                        csv_field(&result.path.display().to_string()),
                        empty.join(",")
                    ))
                }
            }
        }
    }

    /// Format the outcome of a sanitization check.
    pub fn sanitized(&self, path: &Path, sanitized: bool) -> Result<String> {
        match self.format {
            OutputFormat::Plain => Ok(if sanitized { "sanitized" } else { "not sanitized" }.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string(&json!({
                "path": path.display().to_string(),
                "sanitized": sanitized,
            }))?),
            OutputFormat::Csv => Ok(format!("{},{}", csv_field(&path.display().to_string()), sanitized)),
        }
    }

    fn csv_row(&self, path: &Path, success: bool, values: &[f64]) -> String {
        let mut fields = vec![csv_field(&path.display().to_string()), success.to_string()];
        fields.extend(values.iter().map(|v| v.to_string()));
        fields.join(",")
    }
}

/// Quote a CSV field if it contains a separator, quote or line break
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
