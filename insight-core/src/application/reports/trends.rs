// insight-core/src/application/reports/trends.rs

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::domain::analysis::stats::{MetricStats, percent_deviation, round2};
use crate::domain::metrics::catalog::{MetricCatalog, MetricProfile};
use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::MetricSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub range: DateRange,
    /// Buckets per metric, counted from the range actually served.
    pub weeks: u32,
    pub metrics: Vec<MetricTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    pub metric: String,
    pub buckets: Vec<WeekBucket>,
    /// First bucket against the last one.
    pub overall_change_percent: Option<f64>,
    /// Distribution of the weekly values.
    pub stats: MetricStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub value: f64,
    /// Against the previous bucket; `null` for the first one or a zero base.
    pub change_percent: Option<f64>,
}

impl TrendReport {
    pub fn derive(range: DateRange, series: &[MetricSeries], catalog: &MetricCatalog) -> Self {
        let weeks = u32::try_from(week_starts(&range).count()).unwrap_or(u32::MAX);
        let metrics = series
            .iter()
            .map(|s| MetricTrend::derive(&range, s, catalog.profile(s.metric())))
            .collect();

        Self {
            range,
            weeks,
            metrics,
        }
    }
}

impl MetricTrend {
    fn derive(range: &DateRange, series: &MetricSeries, profile: &MetricProfile) -> Self {
        let mut buckets: Vec<WeekBucket> = Vec::new();
        for week_start in week_starts(range) {
            let week_end = week_start + Duration::days(6);
            let values: Vec<f64> = series
                .points()
                .iter()
                .filter(|p| p.date >= week_start && p.date <= week_end)
                .map(|p| p.value)
                .collect();
            let value = profile.aggregate(&values);
            let change_percent = buckets
                .last()
                .and_then(|prev| percent_deviation(value, prev.value))
                .map(round2);
            buckets.push(WeekBucket {
                week_start,
                value,
                change_percent,
            });
        }

        let weekly: Vec<f64> = buckets.iter().map(|b| b.value).collect();
        let overall_change_percent = match (buckets.first(), buckets.last()) {
            (Some(first), Some(last)) if buckets.len() > 1 => {
                percent_deviation(last.value, first.value).map(round2)
            }
            _ => None,
        };

        Self {
            metric: series.metric().to_string(),
            buckets,
            overall_change_percent,
            stats: MetricStats::from_values(&weekly).rounded(),
        }
    }
}

/// Consecutive 7-day windows from the range start; the last one may be partial.
fn week_starts(range: &DateRange) -> impl Iterator<Item = NaiveDate> + '_ {
    range.iter_days().step_by(7)
}
