//! Statistics shared by the CNF and WCNF extractors

use super::stats::{distribution_names, push_distribution};
use crate::{Lit, TrackedVec};
use gbd_domain::{MemoryScope, TerminationRequest};

/// Clause size buckets: index 1..=9 exact, 10 for ten or more literals
const SIZE_BUCKETS: usize = 11;

fn skip_unused_slot<T>(values: &mut [T]) -> &mut [T] {
    values.get_mut(1..).unwrap_or_default()
}

fn grow<T: Clone + Default>(vec: &mut TrackedVec<'_, T>, len: usize) -> Result<(), TerminationRequest> {
    if vec.len() < len {
        vec.resize(len, T::default())?;
    }
    Ok(())
}

/// Size histogram of a clause set
#[derive(Debug, Default, Clone)]
pub(crate) struct SizeHistogram([u64; SIZE_BUCKETS]);

impl SizeHistogram {
    pub(crate) fn add(&mut self, size: usize) {
        self.0[size.min(SIZE_BUCKETS - 1)] += 1;
    }

    pub(crate) fn names(prefix: &str) -> Vec<String> {
        (1..SIZE_BUCKETS - 1)
            .map(|i| format!("{}cls{}", prefix, i))
            .chain(std::iter::once(format!("{}cls10p", prefix)))
            .collect()
    }

    pub(crate) fn push_features(&self, record: &mut Vec<f64>) {
        record.extend(self.0[1..].iter().map(|&count| count as f64));
    }
}

/// Clause counts, horn statistics and literal balance of a clause set
pub(crate) struct ClauseStatistics<'s> {
    scope: &'s dyn MemoryScope,
    variables: usize,
    clauses: u64,
    sizes: SizeHistogram,
    horn: u64,
    inv_horn: u64,
    positive: u64,
    negative: u64,
    variable_horn: TrackedVec<'s, u32>,
    variable_inv_horn: TrackedVec<'s, u32>,
    balance_clause: TrackedVec<'s, f64>,
    literal_occurrences: TrackedVec<'s, u32>,
}

impl<'s> ClauseStatistics<'s> {
    pub(crate) fn new(scope: &'s dyn MemoryScope) -> Self {
        Self {
            scope,
            variables: 0,
            clauses: 0,
            sizes: SizeHistogram::default(),
            horn: 0,
            inv_horn: 0,
            positive: 0,
            negative: 0,
            variable_horn: TrackedVec::new(scope),
            variable_inv_horn: TrackedVec::new(scope),
            balance_clause: TrackedVec::new(scope),
            literal_occurrences: TrackedVec::new(scope),
        }
    }

    /// Feature names; `prefix` applies to everything but the variable count
    pub(crate) fn names(prefix: &str) -> Vec<String> {
        let mut names = vec![format!("{}clauses", prefix), "variables".to_string()];
        names.extend(SizeHistogram::names(prefix));
        for name in ["horn", "invhorn", "positive", "negative"] {
            names.push(format!("{}{}", prefix, name));
        }
        for dist in ["hornvars", "invhornvars", "balancecls", "balancevars"] {
            names.extend(distribution_names(&format!("{}{}", prefix, dist)));
        }
        names
    }

    /// Extend the variable range to cover `clause` without counting it
    pub(crate) fn observe_variables(&mut self, clause: &[Lit]) -> Result<(), TerminationRequest> {
        let max = clause.iter().map(|lit| lit.var() as usize).max().unwrap_or(0);
        if max > self.variables {
            self.variables = max;
            grow(&mut self.variable_horn, max + 1)?;
            grow(&mut self.variable_inv_horn, max + 1)?;
            grow(&mut self.literal_occurrences, 2 * max + 2)?;
        }
        Ok(())
    }

    pub(crate) fn add_clause(&mut self, clause: &[Lit]) -> Result<(), TerminationRequest> {
        self.observe_variables(clause)?;
        self.clauses += 1;
        self.sizes.add(clause.len());

        let mut n_neg = 0;
        for lit in clause {
            if lit.is_negative() {
                n_neg += 1;
            }
            self.literal_occurrences[lit.index()] += 1;
        }
        let n_pos = clause.len() - n_neg;

        if n_neg <= 1 {
            if n_neg == 0 {
                self.positive += 1;
            }
            self.horn += 1;
            for lit in clause {
                self.variable_horn[lit.var() as usize] += 1;
            }
        }
        if n_pos <= 1 {
            if n_pos == 0 {
                self.negative += 1;
            }
            self.inv_horn += 1;
            for lit in clause {
                self.variable_inv_horn[lit.var() as usize] += 1;
            }
        }

        if !clause.is_empty() {
            let balance = n_pos.min(n_neg) as f64 / n_pos.max(n_neg) as f64;
            self.balance_clause.push(balance)?;
        }
        Ok(())
    }

    pub(crate) fn push_features(mut self, record: &mut Vec<f64>) -> Result<(), TerminationRequest> {
        let mut balance_variable = TrackedVec::new(self.scope);
        for var in 1..=self.variables as u32 {
            let pos = f64::from(self.literal_occurrences[Lit::new(var, false).index()]);
            let neg = f64::from(self.literal_occurrences[Lit::new(var, true).index()]);
            if pos.max(neg) > 0.0 {
                balance_variable.push(pos.min(neg) / pos.max(neg))?;
            }
        }

        record.extend_from_slice(&[self.clauses as f64, self.variables as f64]);
        self.sizes.push_features(record);
        record.extend_from_slice(&[
            self.horn as f64,
            self.inv_horn as f64,
            self.positive as f64,
            self.negative as f64,
        ]);
        push_distribution(record, skip_unused_slot(&mut self.variable_horn));
        push_distribution(record, skip_unused_slot(&mut self.variable_inv_horn));
        push_distribution(record, &mut self.balance_clause);
        push_distribution(record, &mut balance_variable);
        Ok(())
    }
}

/// Degree distributions of the variable-clause, variable and clause graphs
pub(crate) struct DegreeStatistics<'s> {
    vcg_vdegree: TrackedVec<'s, u32>,
    vcg_cdegree: TrackedVec<'s, u32>,
    vg_degree: TrackedVec<'s, u64>,
    cg_degree: TrackedVec<'s, u64>,
}

impl<'s> DegreeStatistics<'s> {
    pub(crate) fn new(scope: &'s dyn MemoryScope) -> Self {
        Self {
            vcg_vdegree: TrackedVec::new(scope),
            vcg_cdegree: TrackedVec::new(scope),
            vg_degree: TrackedVec::new(scope),
            cg_degree: TrackedVec::new(scope),
        }
    }

    pub(crate) fn names(prefix: &str) -> Vec<String> {
        ["vcg_vdegree", "vcg_cdegree", "vg_degree", "cg_degree"]
            .iter()
            .flat_map(|dist| distribution_names(&format!("{}{}", prefix, dist)))
            .collect()
    }

    pub(crate) fn observe_variables(&mut self, clause: &[Lit]) -> Result<(), TerminationRequest> {
        let max = clause.iter().map(|lit| lit.var() as usize).max().unwrap_or(0);
        grow(&mut self.vcg_vdegree, max + 1)?;
        grow(&mut self.vg_degree, max + 1)
    }

    /// First pass: variable occurrences and clause sizes
    pub(crate) fn add_clause(&mut self, clause: &[Lit]) -> Result<(), TerminationRequest> {
        self.observe_variables(clause)?;
        self.vcg_cdegree.push(clause.len() as u32)?;
        for lit in clause {
            let var = lit.var() as usize;
            self.vcg_vdegree[var] += 1;
            self.vg_degree[var] += clause.len() as u64;
        }
        Ok(())
    }

    /// Second pass: clause degree as the sum of its variables' occurrences
    pub(crate) fn add_clause_degree(&mut self, clause: &[Lit]) -> Result<(), TerminationRequest> {
        let degree = clause
            .iter()
            .map(|lit| self.vcg_vdegree.get(lit.var() as usize).copied().unwrap_or(0) as u64)
            .sum();
        self.cg_degree.push(degree)
    }

    pub(crate) fn push_features(mut self, record: &mut Vec<f64>) {
        push_distribution(record, skip_unused_slot(&mut self.vcg_vdegree));
        push_distribution(record, &mut self.vcg_cdegree);
        push_distribution(record, skip_unused_slot(&mut self.vg_degree));
        push_distribution(record, &mut self.cg_degree);
    }
}
