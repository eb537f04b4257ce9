// insight-core/src/domain/analysis/stats.rs
//
// Pure descriptive statistics. Degenerate inputs (empty series, zero variance,
// zero expectation) resolve to zero / None, never NaN or infinity.

use serde::{Deserialize, Serialize};

/// Below this the series is treated as flat.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub sample_count: usize,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mean = mean(values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean,
            std_dev: std_dev(values, mean),
            min,
            max,
            sample_count: values.len(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.std_dev < EPSILON
    }

    /// Copy with every field passed through the percentage rounding policy.
    pub fn rounded(&self) -> Self {
        Self {
            mean: round2(self.mean),
            std_dev: round2(self.std_dev),
            min: round2(self.min),
            max: round2(self.max),
            sample_count: self.sample_count,
        }
    }
}

/// Arithmetic mean, 0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N, not N-1).
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `(current - expected) / expected * 100`, or `None` when `expected` is zero.
pub fn percent_deviation(current: f64, expected: f64) -> Option<f64> {
    if expected.abs() < EPSILON {
        return None;
    }
    let pct = (current - expected) / expected * 100.0;
    pct.is_finite().then_some(pct)
}

/// `(value - mean) / std_dev`, or `None` for a flat distribution.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> Option<f64> {
    if std_dev < EPSILON {
        return None;
    }
    let z = (value - mean) / std_dev;
    z.is_finite().then_some(z)
}

/// Percentages and rates: 2 decimal places.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Raw counts: nearest integer.
pub fn round_count(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.round()
}
