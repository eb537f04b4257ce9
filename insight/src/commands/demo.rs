// insight/src/commands/demo.rs
//
// USE CASE: preview the synthetic payload the pipeline would fall back to.

use anyhow::Result;
use std::path::Path;

use insight_core::application::{Endpoint, PipelineOutcome};

use crate::cli::QueryArgs;
use crate::commands::{build_pipeline, build_request};

pub fn execute(project_dir: &Path, endpoint: &str, seed: Option<u64>, query: &QueryArgs) -> Result<()> {
    let endpoint: Endpoint = endpoint.parse()?;
    let (config, pipeline) = build_pipeline(project_dir)?;
    let request = build_request(endpoint, query, &pipeline, &config);

    let payload = pipeline.demo_payload(&request, seed.or(config.demo.seed));
    let envelope = PipelineOutcome::Unconfigured {
        payload,
        reason: "demo preview requested".to_string(),
    }
    .into_envelope();

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
