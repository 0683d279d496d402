//! Propositional literals

use std::fmt;

/// A literal, encoded as `2 * var + sign`
///
/// Variables are 1-based as in DIMACS; `sign` is 1 for a negated literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Largest variable index that can be encoded
    pub const MAX_VAR: u32 = u32::MAX / 2 - 1;

    /// Create a literal from a variable and polarity
    pub fn new(var: u32, negative: bool) -> Self {
        Lit(2 * var + negative as u32)
    }

    /// Convert a non-zero DIMACS integer; `None` for 0 or out of range
    pub fn from_dimacs(value: i64) -> Option<Self> {
        let var = u32::try_from(value.unsigned_abs()).ok()?;
        if var == 0 || var > Self::MAX_VAR {
            return None;
        }
        Some(Lit::new(var, value < 0))
    }

    /// Variable index
    pub fn var(self) -> u32 {
        self.0 >> 1
    }

    /// Whether the literal is negated
    pub fn is_negative(self) -> bool {
        self.0 & 1 == 1
    }

    /// Dense index, usable to address per-literal tables of size `2 * (max_var + 1)`
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The complementary literal
    pub fn negate(self) -> Self {
        Lit(self.0 ^ 1)
    }

    /// Signed DIMACS representation
    pub fn to_dimacs(self) -> i64 {
        let var = i64::from(self.var());
        if self.is_negative() {
            -var
        } else {
            var
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimacs_conversion() {
        let lit = Lit::from_dimacs(-7).unwrap();
        assert_eq!(lit.var(), 7);
        assert!(lit.is_negative());
        assert_eq!(lit.to_dimacs(), -7);
        assert_eq!(lit.negate().to_dimacs(), 7);
        assert_eq!(lit.to_string(), "-7");
    }

    #[test]
    fn test_invalid_values() {
        assert!(Lit::from_dimacs(0).is_none());
        assert!(Lit::from_dimacs(i64::MIN).is_none());
        assert!(Lit::from_dimacs(i64::from(Lit::MAX_VAR) + 1).is_none());
        assert!(Lit::from_dimacs(i64::from(Lit::MAX_VAR)).is_some());
    }

    #[test]
    fn test_index_layout() {
        assert_eq!(Lit::new(1, false).index(), 2);
        assert_eq!(Lit::new(1, true).index(), 3);
    }
}
