//! Feature record module

/// Feature names paired positionally with extracted values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Feature names, in extractor order
    pub names: Vec<String>,
    /// Feature values, aligned with `names`
    pub values: Vec<f64>,
}

impl FeatureRecord {
    /// Create a record from aligned names and values
    ///
    /// # Panics
    /// Panics if the two sequences differ in length.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        assert_eq!(names.len(), values.len(), "Feature names and values must be aligned");
        Self { names, values }
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Iterate over `(name, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record holds no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let record = FeatureRecord::new(
            vec!["clauses".into(), "variables".into()],
            vec![12.0, 5.0],
        );
        assert_eq!(record.get("variables"), Some(5.0));
        assert_eq!(record.get("horn"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_pairs_preserve_order() {
        let record = FeatureRecord::new(vec!["a".into(), "b".into()], vec![1.0, 2.0]);
        let pairs: Vec<_> = record.pairs().collect();
        assert_eq!(pairs, vec![("a", 1.0), ("b", 2.0)]);
    }

    #[test]
    #[should_panic]
    fn test_misaligned_record() {
        FeatureRecord::new(vec!["a".into()], vec![]);
    }
}
