// insight-core/src/application/reports/mod.rs
//
// Derive stage. Real and demo series go through the same functions, so a demo
// payload always has the shape of a real one.

pub mod anomalies;
pub mod overview;
pub mod trends;

pub use anomalies::{AnomalyReport, SeveritySummary};
pub use overview::{MetricSummary, OverviewReport};
pub use trends::{MetricTrend, TrendReport, WeekBucket};

use serde::Serialize;

use crate::application::request::{Endpoint, PipelineRequest};
use crate::domain::analysis::threshold::ThresholdSet;
use crate::domain::metrics::catalog::MetricCatalog;
use crate::domain::metrics::series::MetricSeries;

/// What the cache stores and the envelope carries under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Overview(OverviewReport),
    Anomalies(AnomalyReport),
    Trends(TrendReport),
}

impl Payload {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Payload::Overview(_) => Endpoint::Overview,
            Payload::Anomalies(_) => Endpoint::Anomalies,
            Payload::Trends(_) => Endpoint::Trends,
        }
    }

    pub fn as_anomalies(&self) -> Option<&AnomalyReport> {
        match self {
            Payload::Anomalies(report) => Some(report),
            _ => None,
        }
    }
}

pub struct Derivation<'a> {
    pub catalog: &'a MetricCatalog,
    pub thresholds: &'a ThresholdSet,
}

impl<'a> Derivation<'a> {
    pub fn new(catalog: &'a MetricCatalog, thresholds: &'a ThresholdSet) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    /// `series` holds the metrics that were fetched, `unavailable` the ones that
    /// failed and were replaced by nothing.
    pub fn derive(
        &self,
        request: &PipelineRequest,
        series: &[MetricSeries],
        unavailable: Vec<String>,
    ) -> Payload {
        match request.endpoint {
            Endpoint::Overview => Payload::Overview(OverviewReport::derive(
                request.range,
                series,
                unavailable,
                self.catalog,
            )),
            Endpoint::Anomalies => Payload::Anomalies(AnomalyReport::derive(
                request.range,
                series,
                self.thresholds,
                self.catalog,
            )),
            Endpoint::Trends => Payload::Trends(TrendReport::derive(
                request.range,
                series,
                self.catalog,
            )),
        }
    }
}
