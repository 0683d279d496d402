//! Summary statistics of feature distributions

/// Value type that can be summarized by [`push_distribution`]
pub trait Sample: Copy {
    /// Value as f64
    fn as_f64(self) -> f64;

    /// Category used for entropy; reals are snapped to three decimals
    fn entropy_key(self) -> i64;
}

impl Sample for u32 {
    fn as_f64(self) -> f64 {
        f64::from(self)
    }

    fn entropy_key(self) -> i64 {
        i64::from(self)
    }
}

impl Sample for u64 {
    fn as_f64(self) -> f64 {
        self as f64
    }

    fn entropy_key(self) -> i64 {
        self as i64
    }
}

impl Sample for f64 {
    fn as_f64(self) -> f64 {
        self
    }

    fn entropy_key(self) -> i64 {
        (1000.0 * self).round() as i64
    }
}

/// Incremental arithmetic mean
pub fn mean<T: Sample>(values: &[T]) -> f64 {
    let mut mean = 0.0;
    for (i, value) in values.iter().enumerate() {
        mean += (value.as_f64() - mean) / (i + 1) as f64;
    }
    mean
}

/// Incremental population variance around `mean`
pub fn variance<T: Sample>(values: &[T], mean: f64) -> f64 {
    let mut variance = 0.0;
    for (i, value) in values.iter().enumerate() {
        let diff = value.as_f64() - mean;
        variance += (diff * diff - variance) / (i + 1) as f64;
    }
    variance
}

/// Entropy of the value categories, scaled by log2 of the number of categories
///
/// `sorted` must be sorted so that equal categories are adjacent. Zero if
/// there are fewer than two categories.
pub fn scaled_entropy<T: Sample>(sorted: &[T]) -> f64 {
    let total = sorted.len() as f64;
    let mut summands = Vec::new();

    let mut run = 0usize;
    let mut key = None;
    for value in sorted {
        let k = value.entropy_key();
        if key == Some(k) {
            run += 1;
            continue;
        }
        if run > 0 {
            summands.push(entropy_summand(run, total));
        }
        key = Some(k);
        run = 1;
    }
    if run > 0 {
        summands.push(entropy_summand(run, total));
    }

    if summands.len() <= 1 {
        return 0.0;
    }
    summands.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    let entropy: f64 = -summands.iter().sum::<f64>();
    entropy / (summands.len() as f64).log2()
}

fn entropy_summand(count: usize, total: f64) -> f64 {
    let p = count as f64 / total;
    p * p.log2()
}

/// Names of the five summary values of distribution `prefix`
pub fn distribution_names(prefix: &str) -> [String; 5] {
    ["mean", "variance", "min", "max", "entropy"].map(|stat| format!("{}_{}", prefix, stat))
}

/// Sort `values` and append mean, variance, min, max and scaled entropy
///
/// An empty distribution appends five zeros.
pub fn push_distribution<T: Sample>(record: &mut Vec<f64>, values: &mut [T]) {
    if values.is_empty() {
        record.extend_from_slice(&[0.0; 5]);
        return;
    }
    values.sort_by(|a, b| a.as_f64().total_cmp(&b.as_f64()));
    let mean = mean(values);
    let variance = variance(values, mean);
    let min = values[0].as_f64();
    let max = values[values.len() - 1].as_f64();
    let entropy = scaled_entropy(values);
    record.extend_from_slice(&[mean, variance, min, max, entropy]);
}
