// insight-core/src/domain/analysis/mod.rs

pub mod anomaly;
pub mod severity;
pub mod stats;
pub mod threshold;

pub use anomaly::{Anomaly, AnomalyDetector};
pub use severity::{Direction, Polarity, Severity, classify_severity};
pub use stats::MetricStats;
pub use threshold::{Threshold, ThresholdSet};
