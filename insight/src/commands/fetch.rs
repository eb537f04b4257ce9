// insight/src/commands/fetch.rs
//
// USE CASE: run one endpoint and print the envelope, exactly what an HTTP
// handler would send back with status 200.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use insight_core::application::{Endpoint, Envelope};
use insight_core::infrastructure::fs::write_json;

use crate::cli::QueryArgs;
use crate::commands::{build_pipeline, build_request};

pub async fn execute(
    project_dir: &Path,
    endpoint: &str,
    query: &QueryArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let endpoint: Endpoint = endpoint.parse()?;
    let (config, pipeline) = build_pipeline(project_dir)?;
    let request = build_request(endpoint, query, &pipeline, &config);

    let outcome = pipeline.run(&request).await;
    info!(kind = outcome.kind(), key = %request.cache_key(), "request served");

    let envelope = Envelope::from(outcome);
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if let Some(path) = output {
        write_json(&path, &envelope).with_context(|| format!("Failed to write {:?}", path))?;
        eprintln!("💾 Envelope written to {}", path.display());
    }

    Ok(())
}
