// insight/src/commands/thresholds.rs

use anyhow::Result;
use comfy_table::{Cell, Table};
use std::collections::BTreeSet;
use std::path::Path;

use crate::commands::load_config;

pub fn execute(project_dir: &Path) -> Result<()> {
    let config = load_config(project_dir)?;
    let thresholds = config.analysis.threshold_set()?;
    let catalog = config.analysis.catalog();

    // Every metric that has either a threshold or a profile
    let metrics: BTreeSet<&str> = thresholds
        .entries()
        .map(|(m, _)| m)
        .chain(catalog.entries().map(|(m, _)| m))
        .collect();

    let mut table = Table::new();
    table.set_header(vec![
        "Metric", "Warning ×σ", "Critical ×σ", "Change %", "Enabled", "Polarity", "Aggregation",
    ]);
    for metric in metrics {
        let t = thresholds.get(metric);
        let profile = catalog.profile(metric);
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(t.warning_multiplier),
            Cell::new(t.critical_multiplier),
            Cell::new(t.percent_change_threshold),
            Cell::new(if t.enabled { "yes" } else { "no" }),
            Cell::new(format!("{:?}", profile.polarity)),
            Cell::new(format!("{:?}", profile.aggregation)),
        ]);
    }

    let fallback = thresholds.fallback();
    println!("\n📏 Thresholds for '{}'", config.name);
    println!("{}", table);
    println!(
        "Other metrics: warning {}σ, critical {}σ, change {}%",
        fallback.warning_multiplier, fallback.critical_multiplier, fallback.percent_change_threshold
    );
    Ok(())
}
