//! Base features of CNF instances

use super::common::{ClauseStatistics, DegreeStatistics};
use crate::InstanceReader;
use gbd_domain::{ExtractError, Extractor, MemoryScope};
use std::path::{Path, PathBuf};

/// Size, horn, balance and graph-degree features of a DIMACS CNF file
///
/// Streams the file three times: once for clause statistics, twice for the
/// graph degrees (clause degrees need the final variable occurrences).
#[derive(Debug, Clone)]
pub struct CnfBaseFeatures {
    path: PathBuf,
    features: Vec<f64>,
}

impl Extractor for CnfBaseFeatures {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            features: Vec::new(),
        }
    }

    fn names() -> Vec<String> {
        let mut names = ClauseStatistics::names("");
        names.extend(DegreeStatistics::names(""));
        names
    }

    fn extract(&mut self, scope: &dyn MemoryScope) -> Result<(), ExtractError> {
        let mut features = Vec::new();
        let mut clause = Vec::new();

        let mut stats = ClauseStatistics::new(scope);
        let mut reader = InstanceReader::open(&self.path)?;
        while reader.read_clause(&mut clause)? {
            stats.add_clause(&clause)?;
        }
        stats.push_features(&mut features)?;

        let mut degrees = DegreeStatistics::new(scope);
        let mut reader = InstanceReader::open(&self.path)?;
        while reader.read_clause(&mut clause)? {
            degrees.add_clause(&clause)?;
        }
        let mut reader = InstanceReader::open(&self.path)?;
        while reader.read_clause(&mut clause)? {
            degrees.add_clause_degree(&clause)?;
        }
        degrees.push_features(&mut features);

        tracing::debug!("Extracted {} CNF features from {}", features.len(), self.path.display());
        self.features = features;
        Ok(())
    }

    fn features(&self) -> Vec<f64> {
        self.features.clone()
    }
}
