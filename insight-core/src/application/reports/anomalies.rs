// insight-core/src/application/reports/anomalies.rs

use serde::Serialize;

use crate::domain::analysis::anomaly::{Anomaly, AnomalyDetector};
use crate::domain::analysis::severity::Severity;
use crate::domain::analysis::threshold::ThresholdSet;
use crate::domain::metrics::catalog::MetricCatalog;
use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::MetricSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub range: DateRange,
    /// Metrics that had enough history to be evaluated.
    pub checked: Vec<String>,
    /// Most severe first.
    pub anomalies: Vec<Anomaly>,
    pub summary: SeveritySummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeveritySummary {
    pub critical: usize,
    pub warning: usize,
}

impl AnomalyReport {
    pub fn derive(
        range: DateRange,
        series: &[MetricSeries],
        thresholds: &ThresholdSet,
        catalog: &MetricCatalog,
    ) -> Self {
        let detector = AnomalyDetector::new(thresholds, catalog);

        // A series needs one point to compare plus at least one of history
        let checked: Vec<String> = series
            .iter()
            .filter(|s| s.len() >= 2)
            .map(|s| s.metric().to_string())
            .collect();

        let mut anomalies: Vec<Anomaly> = series
            .iter()
            .filter_map(|s| detector.evaluate_latest(s))
            .collect();
        anomalies.sort_by(|a, b| b.severity.cmp(&a.severity));

        let summary = SeveritySummary {
            critical: count(&anomalies, Severity::Critical),
            warning: count(&anomalies, Severity::Warning),
        };

        Self {
            range,
            checked,
            anomalies,
            summary,
        }
    }
}

fn count(anomalies: &[Anomaly], severity: Severity) -> usize {
    anomalies.iter().filter(|a| a.severity == severity).count()
}
