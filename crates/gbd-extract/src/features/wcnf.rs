//! Base features of weighted (MaxSAT) CNF instances
//!
//! Both file formats are accepted: the old one with a `p wcnf <vars>
//! <clauses> <top>` header, where clauses weighing at least `top` are hard,
//! and the new one, where hard clauses start with `h`.

use super::common::{ClauseStatistics, DegreeStatistics, SizeHistogram};
use super::stats::{distribution_names, push_distribution};
use crate::{InstanceReader, Lit, TrackedVec};
use gbd_domain::{ExtractError, Extractor, MemoryScope};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    Hard,
    Soft(u64),
}

/// Clause stream over a WCNF file
struct WcnfReader {
    reader: InstanceReader,
    top: u64,
}

impl WcnfReader {
    fn open(path: &Path) -> Result<Self, ExtractError> {
        Ok(Self {
            reader: InstanceReader::open(path)?,
            top: 0,
        })
    }

    fn read_header(&mut self) -> Result<(), ExtractError> {
        let line = self.reader.line();
        let header = self.reader.read_line()?;
        let tokens: Vec<&str> = header.split_whitespace().collect();
        if tokens.get(1) != Some(&"wcnf") {
            return Err(ExtractError::Parse {
                line,
                message: format!("expected a wcnf header, found '{}'", header),
            });
        }
        self.top = match tokens.get(4) {
            Some(top) => top.parse().map_err(|_| ExtractError::Parse {
                line,
                message: format!("invalid top weight '{}'", top),
            })?,
            None => 0,
        };
        Ok(())
    }

    /// Next clause and its weight; `None` at end of input
    fn next(&mut self, clause: &mut Vec<Lit>) -> Result<Option<Weight>, ExtractError> {
        loop {
            if !self.reader.skip_whitespace()? {
                return Ok(None);
            }
            match self.reader.peek()? {
                Some(b'c') => {
                    self.reader.skip_line()?;
                }
                Some(b'p') => self.read_header()?,
                Some(b'h') => {
                    self.reader.skip()?;
                    self.reader.read_literals(clause)?;
                    return Ok(Some(Weight::Hard));
                }
                _ => {
                    let weight = self.reader.read_unsigned()?;
                    self.reader.read_literals(clause)?;
                    let hard = weight == 0 || (self.top > 0 && weight >= self.top);
                    return Ok(Some(if hard { Weight::Hard } else { Weight::Soft(weight) }));
                }
            }
        }
    }
}

/// Hard-clause, soft-clause and hard-graph features of a WCNF file
#[derive(Debug, Clone)]
pub struct WcnfBaseFeatures {
    path: PathBuf,
    features: Vec<f64>,
}

impl WcnfBaseFeatures {
    fn soft_names() -> Vec<String> {
        let mut names = vec!["s_clauses".to_string(), "s_weight_sum".to_string()];
        names.extend(SizeHistogram::names("s_"));
        names.extend(distribution_names("s_weight"));
        names
    }

    fn clause_features(&self, scope: &dyn MemoryScope, features: &mut Vec<f64>) -> Result<(), ExtractError> {
        let mut hard = ClauseStatistics::new(scope);
        let mut soft_clauses = 0u64;
        let mut weight_sum = 0u64;
        let mut soft_sizes = SizeHistogram::default();
        let mut weights = TrackedVec::new(scope);

        let mut clause = Vec::new();
        let mut reader = WcnfReader::open(&self.path)?;
        while let Some(weight) = reader.next(&mut clause)? {
            match weight {
                Weight::Hard => hard.add_clause(&clause)?,
                Weight::Soft(w) => {
                    hard.observe_variables(&clause)?;
                    soft_clauses += 1;
                    weight_sum = weight_sum.saturating_add(w);
                    soft_sizes.add(clause.len());
                    weights.push(w)?;
                }
            }
        }

        hard.push_features(features)?;
        features.extend_from_slice(&[soft_clauses as f64, weight_sum as f64]);
        soft_sizes.push_features(features);
        push_distribution(features, &mut weights);
        Ok(())
    }

    fn graph_features(&self, scope: &dyn MemoryScope, features: &mut Vec<f64>) -> Result<(), ExtractError> {
        let mut degrees = DegreeStatistics::new(scope);
        let mut clause = Vec::new();

        let mut reader = WcnfReader::open(&self.path)?;
        while let Some(weight) = reader.next(&mut clause)? {
            match weight {
                Weight::Hard => degrees.add_clause(&clause)?,
                Weight::Soft(_) => degrees.observe_variables(&clause)?,
            }
        }

        let mut reader = WcnfReader::open(&self.path)?;
        while let Some(weight) = reader.next(&mut clause)? {
            if weight == Weight::Hard {
                degrees.add_clause_degree(&clause)?;
            }
        }

        degrees.push_features(features);
        Ok(())
    }
}

impl Extractor for WcnfBaseFeatures {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            features: Vec::new(),
        }
    }

    fn names() -> Vec<String> {
        let mut names = ClauseStatistics::names("h_");
        names.extend(Self::soft_names());
        names.extend(DegreeStatistics::names("h_"));
        names
    }

    fn extract(&mut self, scope: &dyn MemoryScope) -> Result<(), ExtractError> {
        let mut features = Vec::new();
        self.clause_features(scope, &mut features)?;
        self.graph_features(scope, &mut features)?;
        tracing::debug!("Extracted {} WCNF features from {}", features.len(), self.path.display());
        self.features = features;
        Ok(())
    }

    fn features(&self) -> Vec<f64> {
        self.features.clone()
    }
}
