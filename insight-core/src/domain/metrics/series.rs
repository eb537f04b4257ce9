// insight-core/src/domain/metrics/series.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::metrics::range::DateRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered observations for one metric. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    metric: String,
    points: Vec<DataPoint>,
}

impl MetricSeries {
    pub fn new(metric: impl Into<String>, mut points: Vec<DataPoint>) -> Self {
        // Providers do not guarantee ordering; non-finite values are dropped
        points.retain(|p| p.value.is_finite());
        points.sort_by_key(|p| p.date);

        // One point per day: the last one given for a date wins
        let mut unique: Vec<DataPoint> = Vec::with_capacity(points.len());
        for point in points {
            match unique.last_mut() {
                Some(prev) if prev.date == point.date => *prev = point,
                _ => unique.push(point),
            }
        }

        Self {
            metric: metric.into(),
            points: unique,
        }
    }

    pub fn empty(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            points: Vec::new(),
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Splits into (history, latest observation).
    pub fn split_latest(&self) -> Option<(&[DataPoint], &DataPoint)> {
        self.points
            .split_last()
            .map(|(latest, history)| (history, latest))
    }

    pub fn within(&self, range: &DateRange) -> Self {
        Self {
            metric: self.metric.clone(),
            points: self
                .points
                .iter()
                .filter(|p| range.contains(p.date))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::range::parse_date;
    use anyhow::Result;

    #[test]
    fn test_points_are_sorted_and_cleaned() -> Result<()> {
        let series = MetricSeries::new(
            "sessions",
            vec![
                DataPoint::new(parse_date("2024-01-03")?, 3.0),
                DataPoint::new(parse_date("2024-01-01")?, 1.0),
                DataPoint::new(parse_date("2024-01-02")?, f64::NAN),
            ],
        );
        assert_eq!(series.values(), vec![1.0, 3.0]);
        assert_eq!(series.metric(), "sessions");
        Ok(())
    }

    #[test]
    fn test_duplicate_dates_keep_last_given() -> Result<()> {
        let series = MetricSeries::new(
            "sessions",
            vec![
                DataPoint::new(parse_date("2024-01-02")?, 20.0),
                DataPoint::new(parse_date("2024-01-01")?, 1.0),
                DataPoint::new(parse_date("2024-01-02")?, 25.0),
            ],
        );
        assert_eq!(series.values(), vec![1.0, 25.0]);
        let (_, latest) = series.split_latest().ok_or(anyhow::anyhow!("empty"))?;
        assert_eq!(latest.value, 25.0);
        Ok(())
    }

    #[test]
    fn test_split_latest() -> Result<()> {
        let series = MetricSeries::new(
            "users",
            vec![
                DataPoint::new(parse_date("2024-01-01")?, 10.0),
                DataPoint::new(parse_date("2024-01-02")?, 12.0),
            ],
        );
        let (history, latest) = series.split_latest().ok_or(anyhow::anyhow!("empty"))?;
        assert_eq!(history.len(), 1);
        assert_eq!(latest.value, 12.0);
        assert!(MetricSeries::empty("users").split_latest().is_none());
        Ok(())
    }

    #[test]
    fn test_within_filters_by_range() -> Result<()> {
        let series = MetricSeries::new(
            "clicks",
            vec![
                DataPoint::new(parse_date("2024-01-01")?, 1.0),
                DataPoint::new(parse_date("2024-01-05")?, 5.0),
                DataPoint::new(parse_date("2024-01-09")?, 9.0),
            ],
        );
        let range = DateRange::parse("2024-01-02", "2024-01-09")?;
        assert_eq!(series.within(&range).values(), vec![5.0, 9.0]);
        Ok(())
    }
}
