// insight-core/src/application/reports/overview.rs

use serde::Serialize;

use crate::domain::analysis::stats::MetricStats;
use crate::domain::metrics::catalog::MetricCatalog;
use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::{DataPoint, MetricSeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewReport {
    pub range: DateRange,
    pub metrics: Vec<MetricSummary>,
    /// Metrics whose fetch failed; they appear above with an empty series.
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub metric: String,
    /// Sum for counts, mean for rates.
    pub total: f64,
    pub stats: MetricStats,
    pub points: Vec<DataPoint>,
}

impl OverviewReport {
    pub fn derive(
        range: DateRange,
        series: &[MetricSeries],
        unavailable: Vec<String>,
        catalog: &MetricCatalog,
    ) -> Self {
        let metrics = series
            .iter()
            .map(|s| {
                let values = s.values();
                MetricSummary {
                    metric: s.metric().to_string(),
                    total: catalog.profile(s.metric()).aggregate(&values),
                    stats: MetricStats::from_values(&values).rounded(),
                    points: s.points().to_vec(),
                }
            })
            .collect();

        Self {
            range,
            metrics,
            unavailable,
        }
    }
}
