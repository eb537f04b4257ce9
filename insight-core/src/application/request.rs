// insight-core/src/application/request.rs
//
// Query parameters -> typed request. Parsing is lenient: a bad value falls back
// to its default with a warning, it never turns into an error response.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::metrics::range::{DateRange, Period, parse_date};
use crate::domain::project::{AnalysisSettings, TtlSettings};

/// At most this many series per request.
pub const MAX_METRICS: usize = 5;
pub const MAX_WEEKS: u32 = 52;
/// Anomaly checks compare the last day with at least a full week before it.
const MIN_ANOMALY_DAYS: i64 = 8;
/// Longest explicit `startDate..endDate` span served, one point per day per metric.
pub const MAX_RANGE_DAYS: i64 = 366;

/// `None` only if the pattern fails to compile, in which case nothing validates.
fn re_metric_name() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,63}$").ok())
        .as_ref()
}

pub fn is_valid_metric_name(name: &str) -> bool {
    re_metric_name().is_some_and(|re| re.is_match(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Overview,
    Anomalies,
    Trends,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::Overview, Endpoint::Anomalies, Endpoint::Trends];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Overview => "overview",
            Endpoint::Anomalies => "anomalies",
            Endpoint::Trends => "trends",
        }
    }

    pub fn ttl(&self, ttl: &TtlSettings) -> Duration {
        let secs = match self {
            Endpoint::Overview => ttl.overview,
            Endpoint::Anomalies => ttl.anomalies,
            Endpoint::Trends => ttl.trends,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "overview" | "ga" => Ok(Endpoint::Overview),
            "anomalies" | "anomaly-detection" => Ok(Endpoint::Anomalies),
            "trends" | "weekly" => Ok(Endpoint::Trends),
            other => Err(DomainError::UnknownEndpoint(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub endpoint: Endpoint,
    pub range: DateRange,
    pub metrics: Vec<String>,
    pub weeks: u32,
    pub force_refresh: bool,
}

impl PipelineRequest {
    /// Request with every parameter at its default.
    pub fn new(endpoint: Endpoint, today: NaiveDate, defaults: &AnalysisSettings) -> Self {
        let weeks = defaults.default_weeks.clamp(1, MAX_WEEKS);
        Self {
            endpoint,
            range: default_range(endpoint, today, Period::default(), weeks),
            metrics: normalize_metrics(defaults.default_metrics.iter().map(String::as_str)),
            weeks,
            force_refresh: false,
        }
    }

    /// `refresh=true&period=7d&metrics=sessions,users` style query strings.
    pub fn from_query(
        endpoint: Endpoint,
        query: &str,
        today: NaiveDate,
        defaults: &AnalysisSettings,
    ) -> Self {
        Self::from_params(endpoint, parse_query(query), today, defaults)
    }

    pub fn from_params<'a>(
        endpoint: Endpoint,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
        today: NaiveDate,
        defaults: &AnalysisSettings,
    ) -> Self {
        let mut request = Self::new(endpoint, today, defaults);
        let mut period = None;
        let mut start = None;
        let mut end = None;
        let mut requested_metrics: Vec<&str> = Vec::new();

        for (key, value) in params {
            match key {
                "refresh" | "forceRefresh" => request.force_refresh = value.eq_ignore_ascii_case("true"),
                "period" | "dateRange" => match value.parse::<Period>() {
                    Ok(p) => period = Some(p),
                    Err(e) => warn!(value, "{}, using default period", e),
                },
                "startDate" => start = lenient_date("startDate", value),
                "endDate" => end = lenient_date("endDate", value),
                "weeks" => match value.parse::<u32>() {
                    Ok(w) if (1..=MAX_WEEKS).contains(&w) => request.weeks = w,
                    _ => warn!(value, "weeks must be between 1 and {}, using {}", MAX_WEEKS, request.weeks),
                },
                "metrics" | "metric" => requested_metrics.extend(value.split(',')),
                other => warn!(param = other, "ignoring unknown query parameter"),
            }
        }

        // Explicit dates win over a preset period
        let explicit = match (start, end) {
            (Some(s), Some(e)) => Some(DateRange::new(s, e)),
            (Some(s), None) => Some(DateRange::new(s, today)),
            (None, Some(_)) => {
                warn!("endDate without startDate, ignoring it");
                None
            }
            (None, None) => None,
        };
        request.range = match explicit {
            Some(range) if range.days() <= MAX_RANGE_DAYS => range,
            Some(range) => {
                warn!(
                    range = %range,
                    days = range.days(),
                    max = MAX_RANGE_DAYS,
                    "date range too long, using default range"
                );
                default_range(endpoint, today, period.unwrap_or_default(), request.weeks)
            }
            None => default_range(endpoint, today, period.unwrap_or_default(), request.weeks),
        };

        if !requested_metrics.is_empty() {
            let metrics = normalize_metrics(requested_metrics.into_iter());
            if metrics.is_empty() {
                warn!("no valid metric requested, using defaults");
            } else {
                request.metrics = metrics;
            }
        }

        request
    }

    /// Deterministic key: endpoint + metric set + range (+ weeks for trends).
    /// The refresh flag is left out so a forced refresh overwrites the entry
    /// normal reads use.
    pub fn cache_key(&self) -> String {
        let mut metrics = self.metrics.clone();
        metrics.sort();
        let mut key = format!("{}:{}:{}", self.endpoint, metrics.join(","), self.range);
        if self.endpoint == Endpoint::Trends {
            key.push_str(&format!(":w{}", self.weeks));
        }
        key
    }
}

/// `overview?period=7d` -> (`overview`, `period=7d`).
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

pub fn parse_query(query: &str) -> Vec<(&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

fn default_range(endpoint: Endpoint, today: NaiveDate, period: Period, weeks: u32) -> DateRange {
    match endpoint {
        Endpoint::Trends => DateRange::last_days(today, weeks * 7),
        Endpoint::Anomalies => DateRange::for_period(today, period).widened_to(MIN_ANOMALY_DAYS),
        Endpoint::Overview => DateRange::for_period(today, period),
    }
}

fn lenient_date(param: &str, raw: &str) -> Option<NaiveDate> {
    match parse_date(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(param, "{}, ignoring it", e);
            None
        }
    }
}

/// Valid, de-duplicated, capped at [`MAX_METRICS`], order preserved.
fn normalize_metrics<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut metrics = Vec::new();
    for name in names.map(str::trim).filter(|n| !n.is_empty()) {
        if !is_valid_metric_name(name) {
            warn!("{}, dropping it", DomainError::InvalidMetricName(name.to_string()));
            continue;
        }
        if seen.insert(name) {
            metrics.push(name.to_string());
        }
    }
    if metrics.len() > MAX_METRICS {
        warn!(requested = metrics.len(), max = MAX_METRICS, "too many metrics, truncating");
        metrics.truncate(MAX_METRICS);
    }
    metrics
}
