// insight/src/commands/report.rs
//
// USE CASE: anomalies for operators, as a table instead of JSON.

use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use std::path::Path;

use insight_core::application::{Endpoint, PipelineOutcome};
use insight_core::domain::analysis::{Anomaly, Severity};

use crate::cli::QueryArgs;
use crate::commands::{build_pipeline, build_request};

pub async fn execute(project_dir: &Path, query: &QueryArgs) -> Result<()> {
    let (config, pipeline) = build_pipeline(project_dir)?;
    let request = build_request(Endpoint::Anomalies, query, &pipeline, &config);

    let outcome = pipeline.run(&request).await;

    println!(
        "\n🚨 Anomaly report for {} ({} metrics)",
        request.range,
        request.metrics.len()
    );
    match &outcome {
        PipelineOutcome::Fresh { cached: true, .. } => println!("   (served from cache)"),
        PipelineOutcome::Fresh { cached: false, .. } => {}
        PipelineOutcome::Degraded { reason, .. } | PipelineOutcome::Unconfigured { reason, .. } => {
            println!("   ⚠️  DEMO DATA: {}", reason);
        }
    }

    let Some(report) = outcome.payload().as_anomalies() else {
        anyhow::bail!("Pipeline returned a {} payload for an anomalies request", outcome.payload().endpoint());
    };

    if report.anomalies.is_empty() {
        println!("\n✅ No anomaly across {} checked metrics.", report.checked.len());
        return Ok(());
    }

    println!("{}", anomaly_table(&report.anomalies));
    println!(
        "\n{} critical, {} warning",
        report.summary.critical, report.summary.warning
    );
    Ok(())
}

fn anomaly_table(anomalies: &[Anomaly]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Severity", "Current", "Expected", "Deviation", "z", "Direction"]);

    for a in anomalies {
        let severity = match a.severity {
            Severity::Critical => Cell::new(a.severity).fg(Color::Red),
            Severity::Warning => Cell::new(a.severity).fg(Color::Yellow),
            Severity::None => Cell::new(a.severity),
        };
        table.add_row(vec![
            Cell::new(&a.metric),
            severity,
            Cell::new(a.current_value),
            Cell::new(a.expected_value),
            Cell::new(format!("{:+.2}%", a.deviation_percent)),
            Cell::new(format!("{:.2}", a.z_score)),
            Cell::new(format!("{:?}", a.direction).to_lowercase()),
        ]);
    }
    table
}
