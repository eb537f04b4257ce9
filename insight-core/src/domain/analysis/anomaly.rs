// insight-core/src/domain/analysis/anomaly.rs

use serde::{Deserialize, Serialize};

use crate::domain::analysis::severity::{Direction, Severity, classify_severity};
use crate::domain::analysis::stats::{MetricStats, percent_deviation, round2, z_score};
use crate::domain::analysis::threshold::ThresholdSet;
use crate::domain::metrics::catalog::MetricCatalog;
use crate::domain::metrics::series::MetricSeries;

/// One flagged observation. Lives only inside a response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub metric: String,
    pub current_value: f64,
    pub expected_value: f64,
    pub deviation_percent: f64,
    pub z_score: f64,
    pub severity: Severity,
    pub direction: Direction,
    pub description: String,
}

/// Compares a current observation against the distribution of its history.
pub struct AnomalyDetector<'a> {
    thresholds: &'a ThresholdSet,
    catalog: &'a MetricCatalog,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(thresholds: &'a ThresholdSet, catalog: &'a MetricCatalog) -> Self {
        Self {
            thresholds,
            catalog,
        }
    }

    /// Returns `None` when the value is within the configured bands.
    /// Does NOT look at `current` when the history is flat.
    pub fn evaluate(&self, metric: &str, history: &[f64], current: f64) -> Option<Anomaly> {
        let stats = MetricStats::from_values(history);
        if stats.sample_count == 0 || stats.is_flat() {
            return None;
        }

        let z = z_score(current, stats.mean, stats.std_dev);
        let pct = percent_deviation(current, stats.mean);
        let direction = Direction::between(current, stats.mean);
        let profile = self.catalog.profile(metric);

        let severity = classify_severity(
            z,
            pct,
            self.thresholds.get(metric),
            profile.polarity,
            direction,
        );
        if severity == Severity::None {
            return None;
        }

        let current_value = profile.unit.round(current);
        let expected_value = profile.unit.round(stats.mean);
        let deviation_percent = round2(pct.unwrap_or_default());

        Some(Anomaly {
            metric: metric.to_string(),
            current_value,
            expected_value,
            deviation_percent,
            z_score: round2(z.unwrap_or_default()),
            severity,
            direction,
            description: describe(metric, direction, deviation_percent, expected_value, history.len()),
        })
    }

    /// Latest point of the series against everything before it.
    pub fn evaluate_latest(&self, series: &MetricSeries) -> Option<Anomaly> {
        let (history, latest) = series.split_latest()?;
        let values: Vec<f64> = history.iter().map(|p| p.value).collect();
        self.evaluate(series.metric(), &values, latest.value)
    }
}

fn describe(metric: &str, direction: Direction, pct: f64, expected: f64, days: usize) -> String {
    let verb = match direction {
        Direction::Increase => "rose",
        Direction::Decrease => "dropped",
        Direction::Flat => "held",
    };
    format!(
        "{} {} {:.1}% against its {}-day average of {}",
        metric,
        verb,
        pct.abs(),
        days,
        expected
    )
}
