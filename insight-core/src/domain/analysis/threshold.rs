// insight-core/src/domain/analysis/threshold.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_bands"))]
pub struct Threshold {
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_warning")]
    pub warning_multiplier: f64,

    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_critical")]
    pub critical_multiplier: f64,

    #[validate(range(min = 0.0))]
    #[serde(default = "default_percent")]
    pub percent_change_threshold: f64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Threshold {
    pub const fn new(warning: f64, critical: f64, percent: f64) -> Self {
        Self {
            warning_multiplier: warning,
            critical_multiplier: critical,
            percent_change_threshold: percent,
            enabled: true,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new(default_warning(), default_critical(), default_percent())
    }
}

fn default_warning() -> f64 {
    2.0
}
fn default_critical() -> f64 {
    3.0
}
fn default_percent() -> f64 {
    20.0
}
fn default_enabled() -> bool {
    true
}

fn validate_bands(t: &Threshold) -> Result<(), ValidationError> {
    if t.critical_multiplier < t.warning_multiplier {
        let mut err = ValidationError::new("critical_below_warning");
        err.message = Some("criticalMultiplier must be >= warningMultiplier".into());
        return Err(err);
    }
    Ok(())
}

/// Compiled-in thresholds, overridable from `config/thresholds.yml`.
const BUILTIN_THRESHOLDS: [(&str, Threshold); 10] = [
    ("sessions", Threshold::new(2.0, 3.0, 20.0)),
    ("users", Threshold::new(2.0, 3.0, 20.0)),
    ("newUsers", Threshold::new(2.0, 3.0, 25.0)),
    ("pageViews", Threshold::new(2.0, 3.0, 20.0)),
    ("conversions", Threshold::new(2.0, 3.0, 30.0)),
    ("bounceRate", Threshold::new(2.0, 3.0, 15.0)),
    ("engagementRate", Threshold::new(2.0, 3.0, 15.0)),
    ("clicks", Threshold::new(2.0, 3.0, 25.0)),
    ("impressions", Threshold::new(2.0, 3.0, 25.0)),
    ("position", Threshold::new(2.0, 3.0, 20.0)),
];

/// Per-metric thresholds with a fallback for metrics nobody configured.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSet {
    fallback: Threshold,
    per_metric: BTreeMap<String, Threshold>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            fallback: Threshold::default(),
            per_metric: BUILTIN_THRESHOLDS
                .iter()
                .map(|(name, t)| (name.to_string(), *t))
                .collect(),
        }
    }
}

impl ThresholdSet {
    pub fn get(&self, metric: &str) -> &Threshold {
        self.per_metric.get(metric).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &Threshold {
        &self.fallback
    }

    /// Layers overrides on top of the current set after validating each one.
    pub fn with_overrides(
        mut self,
        fallback: Option<Threshold>,
        overrides: &BTreeMap<String, Threshold>,
    ) -> Result<Self, DomainError> {
        if let Some(fb) = fallback {
            check("default", &fb)?;
            self.fallback = fb;
        }
        for (metric, threshold) in overrides {
            check(metric, threshold)?;
            self.per_metric.insert(metric.clone(), *threshold);
        }
        Ok(self)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Threshold)> {
        self.per_metric.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn check(metric: &str, threshold: &Threshold) -> Result<(), DomainError> {
    threshold
        .validate()
        .map_err(|e| DomainError::InvalidThreshold {
            metric: metric.to_string(),
            reason: e.to_string(),
        })
}
