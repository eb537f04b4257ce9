// insight-core/src/domain/demo/mod.rs
//
// Synthetic series used whenever the real source is unconfigured or failing.
// Same seed + same inputs = same payload, which keeps snapshot tests stable.

use chrono::{Datelike, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::analysis::severity::Polarity;
use crate::domain::metrics::catalog::{MetricCatalog, MetricProfile};
use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::{DataPoint, MetricSeries};

const WEEKEND_FACTOR: f64 = 0.7;
const TRAFFIC_NOISE: f64 = 0.10;
const RATE_NOISE: f64 = 0.05;
const SPIKE_FACTOR: f64 = 1.6;

pub struct DemoGenerator {
    rng: StdRng,
}

impl DemoGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed seed when configured, fresh entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }

    /// One value per day, with a weekday/weekend shape for traffic metrics.
    pub fn series(&mut self, metric: &str, profile: &MetricProfile, range: &DateRange) -> MetricSeries {
        let points = range
            .iter_days()
            .map(|date| {
                let value = self.daily_value(profile, date.weekday());
                DataPoint::new(date, value)
            })
            .collect();
        MetricSeries::new(metric, points)
    }

    /// Series for every metric; the first one gets a spike on its last day
    /// so the anomalies view is never empty in demo mode.
    pub fn series_set(
        &mut self,
        metrics: &[String],
        catalog: &MetricCatalog,
        range: &DateRange,
    ) -> Vec<MetricSeries> {
        metrics
            .iter()
            .enumerate()
            .map(|(i, metric)| {
                let profile = catalog.profile(metric);
                let series = self.series(metric, profile, range);
                if i == 0 {
                    with_spike(series, profile)
                } else {
                    series
                }
            })
            .collect()
    }

    fn daily_value(&mut self, profile: &MetricProfile, weekday: Weekday) -> f64 {
        let (shape, noise) = if profile.is_traffic() {
            let shape = match weekday {
                Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
                Weekday::Tue | Weekday::Wed => 1.05,
                _ => 1.0,
            };
            (shape, TRAFFIC_NOISE)
        } else {
            (1.0, RATE_NOISE)
        };
        let jitter = self.rng.gen_range(-noise..=noise);
        profile.unit.round(profile.baseline * shape * (1.0 + jitter))
    }
}

fn with_spike(series: MetricSeries, profile: &MetricProfile) -> MetricSeries {
    let metric = series.metric().to_string();
    let mut points = series.points().to_vec();
    if let Some(last) = points.last_mut() {
        // Push the metric in its unfavorable direction
        let factor = match profile.polarity {
            Polarity::HigherIsBetter => 1.0 / SPIKE_FACTOR,
            Polarity::LowerIsBetter => SPIKE_FACTOR,
        };
        last.value = profile.unit.round(last.value * factor);
    }
    MetricSeries::new(metric, points)
}
