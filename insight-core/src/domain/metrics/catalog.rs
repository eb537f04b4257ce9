// insight-core/src/domain/metrics/catalog.rs
//
// Declarative table of what each metric means: which direction is bad news,
// how daily values roll up, how they are rounded, and the demo baseline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::analysis::severity::Polarity;
use crate::domain::analysis::stats::{round_count, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Counts add up across days (sessions, clicks).
    #[default]
    Sum,
    /// Rates are averaged across days (bounce rate, CTR).
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Count,
    Percent,
    Decimal,
}

impl Unit {
    pub fn round(&self, value: f64) -> f64 {
        match self {
            Unit::Count => round_count(value),
            Unit::Percent | Unit::Decimal => round2(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricProfile {
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub unit: Unit,
    /// Typical daily value, used to shape demo data.
    #[serde(default = "default_baseline")]
    pub baseline: f64,
}

impl MetricProfile {
    pub const fn new(polarity: Polarity, aggregation: Aggregation, unit: Unit, baseline: f64) -> Self {
        Self {
            polarity,
            aggregation,
            unit,
            baseline,
        }
    }

    /// Rolls daily values up into one figure for the period.
    pub fn aggregate(&self, values: &[f64]) -> f64 {
        let raw = match self.aggregation {
            Aggregation::Sum => values.iter().sum::<f64>(),
            Aggregation::Mean => crate::domain::analysis::stats::mean(values),
        };
        self.unit.round(raw)
    }

    /// Traffic-like metrics dip on weekends; rates barely move.
    pub fn is_traffic(&self) -> bool {
        self.aggregation == Aggregation::Sum
    }
}

fn default_baseline() -> f64 {
    100.0
}

impl Default for MetricProfile {
    fn default() -> Self {
        FALLBACK_PROFILE
    }
}

const FALLBACK_PROFILE: MetricProfile =
    MetricProfile::new(Polarity::HigherIsBetter, Aggregation::Sum, Unit::Count, 100.0);

use Aggregation::{Mean, Sum};
use Polarity::{HigherIsBetter, LowerIsBetter};
use Unit::{Count, Decimal, Percent};

const BUILTIN_PROFILES: [(&str, MetricProfile); 12] = [
    ("sessions", MetricProfile::new(HigherIsBetter, Sum, Count, 1200.0)),
    ("users", MetricProfile::new(HigherIsBetter, Sum, Count, 950.0)),
    ("newUsers", MetricProfile::new(HigherIsBetter, Sum, Count, 400.0)),
    ("pageViews", MetricProfile::new(HigherIsBetter, Sum, Count, 3400.0)),
    ("conversions", MetricProfile::new(HigherIsBetter, Sum, Count, 45.0)),
    ("engagementRate", MetricProfile::new(HigherIsBetter, Mean, Percent, 58.0)),
    ("bounceRate", MetricProfile::new(LowerIsBetter, Mean, Percent, 42.0)),
    ("averageSessionDuration", MetricProfile::new(HigherIsBetter, Mean, Decimal, 145.0)),
    ("clicks", MetricProfile::new(HigherIsBetter, Sum, Count, 320.0)),
    ("impressions", MetricProfile::new(HigherIsBetter, Sum, Count, 12000.0)),
    ("ctr", MetricProfile::new(HigherIsBetter, Mean, Percent, 2.7)),
    ("position", MetricProfile::new(LowerIsBetter, Mean, Decimal, 18.5)),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCatalog {
    profiles: BTreeMap<String, MetricProfile>,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self {
            profiles: BUILTIN_PROFILES
                .iter()
                .map(|(name, p)| (name.to_string(), *p))
                .collect(),
        }
    }
}

impl MetricCatalog {
    /// Unknown metrics get the fallback profile (counts, higher is better).
    pub fn profile(&self, metric: &str) -> &MetricProfile {
        self.profiles.get(metric).unwrap_or(&FALLBACK_PROFILE)
    }

    pub fn polarity(&self, metric: &str) -> Polarity {
        self.profile(metric).polarity
    }

    pub fn knows(&self, metric: &str) -> bool {
        self.profiles.contains_key(metric)
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, MetricProfile>) -> Self {
        for (metric, profile) in overrides {
            self.profiles.insert(metric.clone(), *profile);
        }
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &MetricProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }
}
