// insight/src/commands/mod.rs

pub mod demo;
pub mod fetch;
pub mod replay;
pub mod report;
pub mod thresholds;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use insight_core::application::{AnalyticsPipeline, Endpoint, PipelineRequest};
use insight_core::domain::project::ProjectConfig;
use insight_core::infrastructure::config::load_project_config;
use insight_core::infrastructure::error::InfrastructureError;

use crate::cli::QueryArgs;

/// Project config, or standalone demo mode when the directory has none.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig> {
    match load_project_config(project_dir) {
        Ok(config) => Ok(config),
        Err(InfrastructureError::ConfigNotFound(msg)) => {
            warn!("{}", msg);
            let name = project_dir
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "insight".to_string());
            Ok(ProjectConfig::standalone(&name))
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("Failed to load project config in {:?}", project_dir))),
    }
}

pub fn build_pipeline(project_dir: &Path) -> Result<(ProjectConfig, AnalyticsPipeline)> {
    let config = load_config(project_dir)?;
    let pipeline = AnalyticsPipeline::from_config(&config, project_dir)
        .context("Failed to build the analytics pipeline")?;
    Ok((config, pipeline))
}

pub fn build_request(
    endpoint: Endpoint,
    query: &QueryArgs,
    pipeline: &AnalyticsPipeline,
    config: &ProjectConfig,
) -> PipelineRequest {
    let params = query.to_params();
    PipelineRequest::from_params(
        endpoint,
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        pipeline.today(),
        &config.analysis,
    )
}
