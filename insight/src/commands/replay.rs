// insight/src/commands/replay.rs
//
// USE CASE: many requests against ONE pipeline, so the process-wide cache and
// the health counters behave as they would behind a server.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

use insight_core::application::{Endpoint, Envelope, PipelineRequest, split_target};

use crate::commands::build_pipeline;

pub async fn execute(project_dir: &Path, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read request file {:?}", file))?;
    let (config, pipeline) = build_pipeline(project_dir)?;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (path, query) = split_target(line);
        let endpoint: Endpoint = match path.parse() {
            Ok(e) => e,
            Err(e) => {
                warn!(line = line_no + 1, "{}, skipping", e);
                continue;
            }
        };

        let request = PipelineRequest::from_query(endpoint, query, pipeline.today(), &config.analysis);
        let envelope = Envelope::from(pipeline.run(&request).await);
        println!("{}", serde_json::to_string(&envelope)?);
    }

    let snapshot = pipeline.health().snapshot();
    eprintln!("🩺 Health: {}", serde_json::to_string(&snapshot)?);
    if snapshot.serving_demo {
        eprintln!("   ⚠️  Last response was demo data");
    }
    Ok(())
}
