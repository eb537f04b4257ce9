// insight-core/src/domain/analysis/severity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::analysis::threshold::Threshold;

/// An unfavorable move of at least this many percent is always critical.
pub const UNFAVORABLE_CRITICAL_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Flat,
}

impl Direction {
    pub fn between(current: f64, expected: f64) -> Self {
        if current > expected {
            Direction::Increase
        } else if current < expected {
            Direction::Decrease
        } else {
            Direction::Flat
        }
    }
}

/// Which way a metric is allowed to move without being bad news.
/// Traffic and conversions are `HigherIsBetter`; bounce rate is `LowerIsBetter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    pub fn is_unfavorable(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Polarity::HigherIsBetter, Direction::Decrease)
                | (Polarity::LowerIsBetter, Direction::Increase)
        )
    }
}

/// Maps the two deviation signals onto a severity.
///
/// * critical: `|z| >= criticalMultiplier`, or an unfavorable move of 50% or more
/// * warning: `|z| >= warningMultiplier`, or `|pct| >= percentChangeThreshold`
///
/// A flat history (`z_score == None`) or a zero expectation
/// (`percent_deviation == None`) never produces an anomaly.
pub fn classify_severity(
    z_score: Option<f64>,
    percent_deviation: Option<f64>,
    threshold: &Threshold,
    polarity: Polarity,
    direction: Direction,
) -> Severity {
    if !threshold.enabled {
        return Severity::None;
    }
    let (Some(z), Some(pct)) = (z_score, percent_deviation) else {
        return Severity::None;
    };

    let abs_z = z.abs();
    let abs_pct = pct.abs();

    if abs_z >= threshold.critical_multiplier
        || (polarity.is_unfavorable(direction) && abs_pct >= UNFAVORABLE_CRITICAL_PERCENT)
    {
        Severity::Critical
    } else if abs_z >= threshold.warning_multiplier || abs_pct >= threshold.percent_change_threshold
    {
        Severity::Warning
    } else {
        Severity::None
    }
}
