// insight-core/src/domain/metrics/range.rs

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Preset reporting windows accepted by the dashboard and the agent tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl Period {
    pub fn days(&self) -> u32 {
        match self {
            Period::Last7Days => 7,
            Period::Last30Days => 30,
            Period::Last90Days => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last7Days => "7d",
            Period::Last30Days => "30d",
            Period::Last90Days => "90d",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "90d" => Ok(Period::Last90Days),
            other => Err(format!("unsupported period '{}' (expected 7d, 30d or 90d)", other)),
        }
    }
}

/// Inclusive calendar range `[start_date, end_date]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they were given inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self {
                start_date: start,
                end_date: end,
            }
        } else {
            Self {
                start_date: end,
                end_date: start,
            }
        }
    }

    /// The last `days` days ending on `today` (inclusive).
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self::new(today - Duration::days(span), today)
    }

    pub fn for_period(today: NaiveDate, period: Period) -> Self {
        Self::last_days(today, period.days())
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Number of days covered, bounds included.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    /// Extends the start backwards so the range covers `days` days.
    pub fn widened_to(&self, days: i64) -> Self {
        if self.days() >= days {
            return *self;
        }
        Self::new(self.end_date - Duration::days(days - 1), self.end_date)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_date, self.end_date)
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_last_days_is_inclusive() -> Result<()> {
        let today = parse_date("2024-03-10")?;
        let range = DateRange::last_days(today, 7);
        assert_eq!(range.start_date, parse_date("2024-03-04")?);
        assert_eq!(range.end_date, today);
        assert_eq!(range.days(), 7);
        assert_eq!(range.iter_days().count(), 7);
        Ok(())
    }

    #[test]
    fn test_inverted_bounds_are_swapped() -> Result<()> {
        let range = DateRange::parse("2024-02-10", "2024-02-01")?;
        assert_eq!(range.start_date, parse_date("2024-02-01")?);
        assert_eq!(range.days(), 10);
        Ok(())
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("90d".parse::<Period>(), Ok(Period::Last90Days));
        assert!("14d".parse::<Period>().is_err());
        assert_eq!(Period::default().days(), 30);
    }

    #[test]
    fn test_widened_keeps_end_date() -> Result<()> {
        let range = DateRange::parse("2024-01-08", "2024-01-14")?;
        let wide = range.widened_to(28);
        assert_eq!(wide.end_date, range.end_date);
        assert_eq!(wide.days(), 28);
        assert_eq!(range.widened_to(3), range);
        Ok(())
    }

    #[test]
    fn test_invalid_date() {
        assert!(matches!(
            parse_date("2024/01/01"),
            Err(DomainError::InvalidDate(_))
        ));
    }
}
