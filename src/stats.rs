use serde::Serialize;

/// Running mean and variance (Welford).
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; `NaN` marks a missing observation and is skipped.
    pub fn add(&mut self, val: f64) {
        if val.is_nan() {
            return;
        }
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn count(&self) -> usize {
        self.n_vals
    }

    pub fn mean(&self) -> f64 {
        if self.n_vals == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: self.mean(),
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
            count: self.n_vals,
        }
    }
}

/// Summary of the non-missing values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Returns `None` when no value is present.
    pub fn from_values(vals: &[f64]) -> Option<Self> {
        let mut valid: Vec<f64> = vals.iter().copied().filter(|val| !val.is_nan()).collect();
        if valid.is_empty() {
            return None;
        }
        valid.sort_by(f64::total_cmp);

        Some(Self {
            mean: compute_mean(&valid),
            median: compute_median(&valid),
            std_dev: compute_var(&valid).sqrt(),
            min: valid[0],
            max: valid[valid.len() - 1],
        })
    }
}

fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

fn compute_var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = compute_mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

// Expects sorted input.
fn compute_median(sorted: &[f64]) -> f64 {
    let n_vals = sorted.len();
    match n_vals {
        0 => f64::NAN,
        _ if n_vals % 2 == 1 => sorted[n_vals / 2],
        _ => (sorted[n_vals / 2 - 1] + sorted[n_vals / 2]) / 2.0,
    }
}
