//! CNF transformations: normalization, sanitization and the reduction to
//! independent set
//!
//! All transformations stream the input twice: once to compute the header,
//! once to emit clauses.

use crate::{InstanceReader, Lit};
use gbd_domain::ExtractError;
use std::io::Write;
use std::path::Path;

/// Literal membership of the current clause, stamped per clause
struct ClauseMask {
    stamps: Vec<u64>,
    stamp: u64,
}

impl ClauseMask {
    fn new(max_var: u32) -> Self {
        Self {
            stamps: vec![0; 2 * max_var as usize + 2],
            stamp: 0,
        }
    }

    fn next_clause(&mut self) {
        self.stamp += 1;
    }

    fn contains(&self, lit: Lit) -> bool {
        self.stamps.get(lit.index()) == Some(&self.stamp)
    }

    fn insert(&mut self, lit: Lit) {
        if let Some(slot) = self.stamps.get_mut(lit.index()) {
            *slot = self.stamp;
        }
    }

    /// Copy `clause` into `out` without duplicates; false if it is a tautology
    fn sanitize(&mut self, clause: &[Lit], out: &mut Vec<Lit>) -> bool {
        self.next_clause();
        out.clear();
        for &lit in clause {
            if self.contains(lit.negate()) {
                return false;
            }
            if !self.contains(lit) {
                self.insert(lit);
                out.push(lit);
            }
        }
        true
    }
}

/// Largest variable and number of clauses of a CNF file
pub fn determine_counts(path: &Path) -> Result<(u32, u64), ExtractError> {
    let mut reader = InstanceReader::open(path)?;
    let mut clause = Vec::new();
    let mut max_var = 0;
    let mut clauses = 0;
    while reader.read_clause(&mut clause)? {
        max_var = clause.iter().map(|lit| lit.var()).fold(max_var, u32::max);
        clauses += 1;
    }
    Ok((max_var, clauses))
}

fn write_clause<W: Write>(out: &mut W, clause: &[Lit]) -> Result<(), ExtractError> {
    for lit in clause {
        write!(out, "{} ", lit)?;
    }
    writeln!(out, "0")?;
    Ok(())
}

/// Write `path` without comments, under a header recomputed from its clauses
pub fn normalize<W: Write>(path: &Path, out: &mut W) -> Result<(), ExtractError> {
    let (max_var, clauses) = determine_counts(path)?;
    writeln!(out, "p cnf {} {}", max_var, clauses)?;

    let mut reader = InstanceReader::open(path)?;
    let mut clause = Vec::new();
    while reader.read_clause(&mut clause)? {
        write_clause(out, &clause)?;
    }
    Ok(())
}

/// Like [`normalize`], also dropping duplicate literals and tautological clauses
///
/// The order of clauses and literals is preserved. Returns the number of
/// removed clauses.
pub fn sanitize<W: Write>(path: &Path, out: &mut W) -> Result<u64, ExtractError> {
    let (max_var, _) = determine_counts(path)?;
    let mut mask = ClauseMask::new(max_var);
    let mut clause = Vec::new();
    let mut kept = Vec::new();

    let mut surviving = 0u64;
    let mut removed = 0u64;
    let mut reader = InstanceReader::open(path)?;
    while reader.read_clause(&mut clause)? {
        if mask.sanitize(&clause, &mut kept) {
            surviving += 1;
        } else {
            removed += 1;
        }
    }

    writeln!(out, "p cnf {} {}", max_var, surviving)?;
    let mut reader = InstanceReader::open(path)?;
    while reader.read_clause(&mut clause)? {
        if mask.sanitize(&clause, &mut kept) {
            write_clause(out, &kept)?;
        }
    }

    if removed > 0 {
        tracing::debug!("Removed {} tautological clauses from {}", removed, path.display());
    }
    Ok(removed)
}

/// Whether `path` has neither duplicate literals nor tautological clauses
pub fn check_sanitized(path: &Path) -> Result<bool, ExtractError> {
    let (max_var, _) = determine_counts(path)?;
    let mut mask = ClauseMask::new(max_var);
    let mut clause = Vec::new();

    let mut reader = InstanceReader::open(path)?;
    while reader.read_clause(&mut clause)? {
        mask.next_clause();
        for &lit in &clause {
            if mask.contains(lit) || mask.contains(lit.negate()) {
                return Ok(false);
            }
            mask.insert(lit);
        }
    }
    Ok(true)
}

/// Size limits for [`cnf2kis`]; zero means unlimited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KisLimits {
    /// Largest number of (directed) edges to generate
    pub max_edges: u64,
    /// Largest number of nodes to generate
    pub max_nodes: u64,
}

impl KisLimits {
    fn exceeded_by(&self, nodes: u64, edges: u64) -> bool {
        (self.max_edges > 0 && edges > self.max_edges) || (self.max_nodes > 0 && nodes > self.max_nodes)
    }
}

/// Size of the independent set problem built by [`cnf2kis`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KisReport {
    /// One node per literal occurrence
    pub nodes: u64,
    /// Directed edges, each undirected edge counted in both directions
    pub edges: u64,
    /// Independent set size that witnesses satisfiability (the clause count)
    pub k: u64,
    /// False if a limit was exceeded and nothing was written
    pub generated: bool,
}

fn write_edge<W: Write>(out: &mut W, a: u64, b: u64) -> Result<(), ExtractError> {
    writeln!(out, "{} {} 0", a, b)?;
    writeln!(out, "{} {} 0", b, a)?;
    Ok(())
}

/// Reduce a CNF file to a k-independent-set problem in `p kis` format
///
/// Every literal occurrence becomes a node. The literals of a clause form a
/// clique and complementary occurrences are connected. The formula is
/// satisfiable iff the graph has an independent set of size `k`, the number of
/// clauses. If `limits` are exceeded, nothing is written.
pub fn cnf2kis<W: Write>(path: &Path, limits: KisLimits, out: &mut W) -> Result<KisReport, ExtractError> {
    let mut occurrences: Vec<Vec<u64>> = Vec::new();
    let mut clause = Vec::new();
    let mut nodes = 0u64;
    let mut edges = 0u64;
    let mut k = 0u64;

    let mut reader = InstanceReader::open(path)?;
    while reader.read_clause(&mut clause)? {
        let size = clause.len() as u64;
        edges += size * size.saturating_sub(1) / 2;
        for (offset, lit) in clause.iter().enumerate() {
            if lit.index() >= occurrences.len() {
                occurrences.resize_with(2 * lit.var() as usize + 2, Vec::new);
            }
            occurrences[lit.index()].push(nodes + 1 + offset as u64);
        }
        nodes += size;
        k += 1;
    }
    for pair in occurrences.chunks(2) {
        if let [positive, negative] = pair {
            edges += positive.len() as u64 * negative.len() as u64;
        }
    }
    edges *= 2;

    let mut report = KisReport {
        nodes,
        edges,
        k,
        generated: false,
    };
    if limits.exceeded_by(nodes, edges) {
        tracing::debug!(
            "Skipping kis reduction of {}: {} nodes, {} edges",
            path.display(),
            nodes,
            edges
        );
        return Ok(report);
    }

    writeln!(out, "c satisfiable iff maximum independent set size is {}", k)?;
    writeln!(out, "c kis nNodes nEdges k")?;
    writeln!(out, "p kis {} {} {}", nodes, edges, k)?;

    let mut first = 1u64;
    let mut reader = InstanceReader::open(path)?;
    while reader.read_clause(&mut clause)? {
        let size = clause.len() as u64;
        for i in 0..size {
            for j in i + 1..size {
                write_edge(out, first + i, first + j)?;
            }
        }
        first += size;
    }
    for pair in occurrences.chunks(2) {
        if let [positive, negative] = pair {
            for &a in positive {
                for &b in negative {
                    write_edge(out, a, b)?;
                }
            }
        }
    }

    report.generated = true;
    Ok(report)
}
