//! Base features of pseudo-Boolean (OPB) instances
//!
//! Constraints are classified by shape: clauses, cardinality constraints (all
//! coefficients of equal magnitude) and general PB constraints, each split by
//! relation. `<=` constraints are negated into `>=` form first.

use super::stats::{distribution_names, push_distribution};
use crate::{InstanceReader, TrackedVec};
use gbd_domain::{ExtractError, Extractor, MemoryScope};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    AtLeast,
    Equal,
}

/// Linear term sum `c1 x1 + c2 ~x2 + ...`, summarized while it is read
struct TermSum {
    min: f64,
    max: f64,
    min_magnitude: f64,
    max_var: u64,
}

impl TermSum {
    /// Read terms up to a relation or `;`, collecting coefficients in `coeffs`
    fn read(reader: &mut InstanceReader, coeffs: &mut TrackedVec<f64>) -> Result<Self, ExtractError> {
        coeffs.clear();
        let mut max_var = 0;
        loop {
            if !reader.skip_whitespace()? {
                return Err(parse_error(reader, "unexpected end of input"));
            }
            if matches!(reader.peek()?, Some(b';' | b'>' | b'<' | b'=')) {
                break;
            }
            let coeff = read_float(reader)?;
            reader.skip_whitespace()?;
            if reader.peek()? == Some(b'~') {
                reader.skip()?;
                reader.skip_whitespace()?;
            }
            reader.skip_string("x")?;
            max_var = max_var.max(reader.read_unsigned()?);
            coeffs.push(coeff)?;
        }
        Ok(Self::summarize(coeffs, max_var))
    }

    fn summarize(coeffs: &[f64], max_var: u64) -> Self {
        let mut sum = TermSum {
            min: 0.0,
            max: 0.0,
            min_magnitude: f64::MAX,
            max_var,
        };
        for &coeff in coeffs {
            if coeff < 0.0 {
                sum.min += coeff;
            } else {
                sum.max += coeff;
            }
            sum.min_magnitude = sum.min_magnitude.min(coeff.abs());
        }
        sum
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Shape {
    unsat: bool,
    assignment: bool,
    clause: bool,
    card: bool,
}

fn analyse(coeffs: &[f64], terms: &TermSum, relation: Relation, bound: f64) -> Shape {
    let card = match coeffs.first() {
        Some(first) => coeffs.iter().all(|c| c.abs() == first.abs()),
        None => false,
    };
    match relation {
        Relation::AtLeast => Shape {
            unsat: terms.max < bound,
            assignment: terms.max - terms.min_magnitude < bound && terms.max > bound,
            clause: bound > terms.min && bound <= terms.min + terms.min_magnitude,
            card,
        },
        Relation::Equal => Shape {
            unsat: terms.min > bound || terms.max < bound,
            assignment: bound == terms.max || bound == terms.min,
            clause: false,
            card,
        },
    }
}

fn parse_error(reader: &InstanceReader, message: &str) -> ExtractError {
    ExtractError::Parse {
        line: reader.line(),
        message: message.to_string(),
    }
}

fn read_float(reader: &mut InstanceReader) -> Result<f64, ExtractError> {
    let token = reader
        .read_number_token()?
        .ok_or_else(|| parse_error(reader, "unexpected end of input"))?;
    token
        .parse()
        .map_err(|_| parse_error(reader, &format!("invalid coefficient '{}'", token)))
}

fn read_relation(reader: &mut InstanceReader) -> Result<(Relation, bool), ExtractError> {
    match reader.peek()? {
        Some(b'>') => {
            reader.skip_string(">=")?;
            Ok((Relation::AtLeast, false))
        }
        Some(b'<') => {
            reader.skip_string("<=")?;
            Ok((Relation::AtLeast, true))
        }
        Some(b'=') => {
            reader.skip()?;
            Ok((Relation::Equal, false))
        }
        _ => Err(parse_error(reader, "expected a relation")),
    }
}

fn skip_terminator(reader: &mut InstanceReader) -> Result<(), ExtractError> {
    reader.skip_whitespace()?;
    if reader.peek()? == Some(b';') {
        reader.skip()?;
    }
    Ok(())
}

/// Constraint-shape and objective features of an OPB file
#[derive(Debug, Clone)]
pub struct OpbBaseFeatures {
    path: PathBuf,
    features: Vec<f64>,
}

#[derive(Debug, Default)]
struct Counts {
    variables: u64,
    constraints: u64,
    pbs_ge: u64,
    pbs_eq: u64,
    cards_ge: u64,
    cards_eq: u64,
    clauses: u64,
    assignments: u64,
    trivially_unsat: bool,
    obj_terms: u64,
    obj_max: f64,
    obj_min: f64,
}

impl Counts {
    fn add_constraint(&mut self, shape: Shape, relation: Relation) {
        self.constraints += 1;
        self.trivially_unsat |= shape.unsat;
        if shape.assignment {
            self.assignments += 1;
        }
        let slot = match (shape.clause, shape.card, relation) {
            (true, _, _) => &mut self.clauses,
            (false, true, Relation::AtLeast) => &mut self.cards_ge,
            (false, true, Relation::Equal) => &mut self.cards_eq,
            (false, false, Relation::AtLeast) => &mut self.pbs_ge,
            (false, false, Relation::Equal) => &mut self.pbs_eq,
        };
        *slot += 1;
    }
}

impl Extractor for OpbBaseFeatures {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            features: Vec::new(),
        }
    }

    fn names() -> Vec<String> {
        let mut names: Vec<String> = [
            "constraints",
            "variables",
            "pbs_ge",
            "pbs_eq",
            "cards_ge",
            "cards_eq",
            "clauses",
            "assignments",
            "trivially_unsat",
            "obj_terms",
            "obj_max_val",
            "obj_min_val",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();
        names.extend(distribution_names("obj_coeffs"));
        names
    }

    fn extract(&mut self, scope: &dyn MemoryScope) -> Result<(), ExtractError> {
        let mut counts = Counts::default();
        let mut coeffs = TrackedVec::new(scope);
        let mut objective = TrackedVec::new(scope);
        let mut seen_objective = false;

        let mut reader = InstanceReader::open(&self.path)?;
        while reader.skip_whitespace()? {
            match reader.peek()? {
                Some(b'*') => {
                    reader.skip_line()?;
                }
                Some(b'm') => {
                    reader.skip_string("min:")?;
                    // only the first objective counts
                    if seen_objective {
                        reader.skip_line()?;
                        continue;
                    }
                    seen_objective = true;
                    let terms = TermSum::read(&mut reader, &mut objective)?;
                    counts.obj_terms = objective.len() as u64;
                    counts.obj_max = terms.max;
                    counts.obj_min = terms.min;
                    counts.variables = counts.variables.max(terms.max_var);
                    skip_terminator(&mut reader)?;
                }
                _ => {
                    let mut terms = TermSum::read(&mut reader, &mut coeffs)?;
                    let (relation, flip) = read_relation(&mut reader)?;
                    let mut bound = read_float(&mut reader)?;
                    if flip {
                        coeffs.iter_mut().for_each(|c| *c = -*c);
                        bound = -bound;
                        terms = TermSum::summarize(&coeffs, terms.max_var);
                    }
                    skip_terminator(&mut reader)?;

                    counts.variables = counts.variables.max(terms.max_var);
                    let shape = analyse(&coeffs, &terms, relation, bound);
                    counts.add_constraint(shape, relation);
                }
            }
        }

        let mut features = vec![
            counts.constraints as f64,
            counts.variables as f64,
            counts.pbs_ge as f64,
            counts.pbs_eq as f64,
            counts.cards_ge as f64,
            counts.cards_eq as f64,
            counts.clauses as f64,
            counts.assignments as f64,
            if counts.trivially_unsat { 1.0 } else { 0.0 },
            counts.obj_terms as f64,
            counts.obj_max,
            counts.obj_min,
        ];
        push_distribution(&mut features, &mut objective);
        tracing::debug!("Extracted {} OPB features from {}", features.len(), self.path.display());
        self.features = features;
        Ok(())
    }

    fn features(&self) -> Vec<f64> {
        self.features.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbd_domain::Untracked;
    use std::io::Cursor;

    fn read_constraint(text: &str) -> (Shape, Relation) {
        let mut reader = InstanceReader::from_reader(Cursor::new(text.as_bytes().to_vec()));
        let scope = Untracked;
        let mut coeffs = TrackedVec::new(&scope);
        let mut terms = TermSum::read(&mut reader, &mut coeffs).unwrap();
        let (relation, flip) = read_relation(&mut reader).unwrap();
        let mut bound = read_float(&mut reader).unwrap();
        if flip {
            coeffs.iter_mut().for_each(|c| *c = -*c);
            bound = -bound;
            terms = TermSum::summarize(&coeffs, terms.max_var);
        }
        (analyse(&coeffs, &terms, relation, bound), relation)
    }

    #[test]
    fn test_clause_shape() {
        let (shape, relation) = read_constraint("+1 x1 +1 ~x2 >= 1 ;");
        assert_eq!(relation, Relation::AtLeast);
        assert!(shape.clause);
        assert!(shape.card);
        assert!(!shape.unsat);
    }

    #[test]
    fn test_less_equal_is_negated() {
        // at most one of x1, x2 is the clause ~x1 | ~x2
        let (shape, relation) = read_constraint("+1 x1 +1 x2 <= 1 ;");
        assert_eq!(relation, Relation::AtLeast);
        assert!(shape.card);
        assert!(shape.clause);

        let (shape, _) = read_constraint("+1 x1 +1 x2 <= -1 ;");
        assert!(shape.unsat);
    }

    #[test]
    fn test_equality_assignment() {
        let (shape, relation) = read_constraint("+1 x1 +2 x2 = 3 ;");
        assert_eq!(relation, Relation::Equal);
        assert!(shape.assignment);
        assert!(!shape.card);
        assert!(!shape.clause);
    }

    #[test]
    fn test_missing_relation_is_a_parse_error() {
        let mut reader = InstanceReader::from_reader(Cursor::new(b"+1 x1 +1 x2".to_vec()));
        let scope = Untracked;
        let mut coeffs = TrackedVec::new(&scope);
        assert!(matches!(
            TermSum::read(&mut reader, &mut coeffs),
            Err(ExtractError::Parse { .. })
        ));
    }
}
