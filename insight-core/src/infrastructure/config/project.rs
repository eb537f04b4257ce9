// insight-core/src/infrastructure/config/project.rs

use serde::{Deserialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::domain::analysis::threshold::Threshold;
use crate::domain::metrics::catalog::MetricProfile;
use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["insight_project_conf.yaml", "insight.yaml"];

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Locate the main file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project config");

    // 2. Base YAML
    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 3. Satellite files, a corrupted one stops everything
    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    // 4. Environment wins over files
    apply_env_overrides(&mut config);

    // 5. Reject inconsistent bands before anything is served
    config
        .analysis
        .threshold_set()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    Ok(config)
}

pub fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Reads a typed YAML fragment. `T` is the wrapper shape expected in the file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| {
        InfrastructureError::ConfigError(format!("Failed to parse YAML at {:?}: {}", path, e))
    })
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    // A. Threshold bands
    let thresholds_path = config_dir.join("thresholds.yml");
    if thresholds_path.exists() {
        #[derive(Deserialize)]
        struct ThresholdsWrapper {
            #[serde(rename = "default-threshold", default)]
            default_threshold: Option<Threshold>,
            #[serde(default)]
            thresholds: BTreeMap<String, Threshold>,
        }

        let wrapper: ThresholdsWrapper = load_fragment(&thresholds_path)?;
        if wrapper.default_threshold.is_some() {
            config.analysis.default_threshold = wrapper.default_threshold;
        }
        let count = wrapper.thresholds.len();
        config.analysis.thresholds.extend(wrapper.thresholds);
        info!(count, "  📏 Threshold overrides loaded");
    }

    // B. Metric profiles
    let metrics_path = config_dir.join("metrics.yml");
    if metrics_path.exists() {
        #[derive(Deserialize)]
        struct MetricsWrapper {
            #[serde(default)]
            metrics: BTreeMap<String, MetricProfile>,
        }

        let wrapper: MetricsWrapper = load_fragment(&metrics_path)?;
        let count = wrapper.metrics.len();
        config.analysis.metrics.extend(wrapper.metrics);
        info!(count, "  📊 Metric profiles loaded");
    }

    Ok(())
}

fn apply_env_overrides(config: &mut ProjectConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut ProjectConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("INSIGHT_CACHE_CAPACITY") {
        match val.trim().parse::<usize>() {
            Ok(capacity) => {
                info!(old = config.cache.capacity, new = capacity, "Overriding cache capacity via ENV");
                config.cache.capacity = capacity;
            }
            Err(_) => warn!(value = %val, "Ignoring non-numeric INSIGHT_CACHE_CAPACITY"),
        }
    }
    if let Some(val) = var("INSIGHT_DEMO_SEED") {
        match val.trim().parse::<u64>() {
            Ok(seed) => {
                info!(seed, "Overriding demo seed via ENV");
                config.demo.seed = Some(seed);
            }
            Err(_) => warn!(value = %val, "Ignoring non-numeric INSIGHT_DEMO_SEED"),
        }
    }
    if let Some(val) = var("INSIGHT_DATA_DIR") {
        info!(old = ?config.source.data_dir, new = ?val, "Overriding data dir via ENV");
        config.source.data_dir = val;
    }
}
