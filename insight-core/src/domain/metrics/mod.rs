// insight-core/src/domain/metrics/mod.rs

pub mod catalog;
pub mod range;
pub mod series;

pub use catalog::{Aggregation, MetricCatalog, MetricProfile, Unit};
pub use range::{DateRange, Period};
pub use series::{DataPoint, MetricSeries};
