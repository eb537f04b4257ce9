// src/domain/project/configuration.rs

use crate::domain::analysis::threshold::{Threshold, ThresholdSet};
use crate::domain::error::DomainError;
use crate::domain::metrics::catalog::{MetricCatalog, MetricProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which adapter backs the pipeline.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON / YAML series files under `data-dir`.
    #[default]
    File,
    /// No upstream at all: every response is demo data.
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub demo: DemoSettings,

    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub ttl: TtlSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl: TtlSettings::default(),
        }
    }
}

/// Seconds. Volatile views expire fast, weekly rollups slowly.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TtlSettings {
    #[serde(default = "default_overview_ttl")]
    pub overview: u64,
    #[serde(default = "default_anomalies_ttl")]
    pub anomalies: u64,
    #[serde(default = "default_trends_ttl")]
    pub trends: u64,
}

impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            overview: default_overview_ttl(),
            anomalies: default_anomalies_ttl(),
            trends: default_trends_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceSettings {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,
    /// Env vars that must be set before the source counts as configured
    /// (e.g. GA4_PROPERTY_ID, GOOGLE_SERVICE_ACCOUNT_JSON).
    #[serde(rename = "required-env", default)]
    pub required_env: Vec<String>,
}

impl SourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            data_dir: default_data_dir(),
            timeout_secs: default_timeout(),
            required_env: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DemoSettings {
    /// Fixed seed for reproducible demo payloads. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisSettings {
    #[serde(rename = "default-metrics", default = "default_metrics")]
    pub default_metrics: Vec<String>,
    #[serde(rename = "default-weeks", default = "default_weeks")]
    pub default_weeks: u32,
    #[serde(rename = "default-threshold", default)]
    pub default_threshold: Option<Threshold>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, Threshold>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricProfile>,
}

impl AnalysisSettings {
    pub fn threshold_set(&self) -> Result<ThresholdSet, DomainError> {
        ThresholdSet::default().with_overrides(self.default_threshold, &self.thresholds)
    }

    pub fn catalog(&self) -> MetricCatalog {
        MetricCatalog::default().with_overrides(&self.metrics)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_metrics: default_metrics(),
            default_weeks: default_weeks(),
            default_threshold: None,
            thresholds: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Config used when no project file exists: demo mode with defaults.
    pub fn standalone(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: default_version(),
            config_paths: default_config_paths(),
            cache: CacheSettings::default(),
            source: SourceSettings {
                kind: SourceKind::None,
                ..SourceSettings::default()
            },
            demo: DemoSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_capacity() -> usize {
    100
}
fn default_overview_ttl() -> u64 {
    5 * 60
}
fn default_anomalies_ttl() -> u64 {
    15 * 60
}
fn default_trends_ttl() -> u64 {
    30 * 60
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_weeks() -> u32 {
    8
}
fn default_metrics() -> Vec<String> {
    ["sessions", "users", "pageViews", "bounceRate", "conversions"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_minimal_yaml_gets_defaults() -> Result<()> {
        let config: ProjectConfig = serde_yaml::from_str("name: partnerlab")?;
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.cache.ttl.overview, 300);
        assert_eq!(config.cache.ttl.trends, 1800);
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.source.timeout(), Duration::from_secs(10));
        assert_eq!(config.analysis.default_metrics.len(), 5);
        assert!(config.demo.seed.is_none());
        Ok(())
    }

    #[test]
    fn test_full_yaml() -> Result<()> {
        let yaml = r#"
name: partnerlab
cache:
  capacity: 50
  ttl:
    anomalies: 60
source:
  kind: none
  required-env: [GA4_PROPERTY_ID]
demo:
  seed: 42
analysis:
  thresholds:
    sessions:
      warningMultiplier: 1.5
  metrics:
    refunds:
      polarity: lower_is_better
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl.anomalies, 60);
        assert_eq!(config.cache.ttl.overview, 300);
        assert_eq!(config.source.kind, SourceKind::None);
        assert_eq!(config.source.required_env, vec!["GA4_PROPERTY_ID"]);
        assert_eq!(config.demo.seed, Some(42));
        let thresholds = config.analysis.threshold_set()?;
        assert_eq!(thresholds.get("sessions").warning_multiplier, 1.5);
        assert!(config.analysis.catalog().knows("refunds"));
        Ok(())
    }
}
