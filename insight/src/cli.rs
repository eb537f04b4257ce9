// insight/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "insight")]
#[command(about = "Analytics derivation pipeline: fetch, cache, statistics, demo fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory (holds insight.yaml)
    #[arg(long, global = true, default_value = ".", env = "INSIGHT_PROJECT_DIR")]
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Query parameters shared by the commands that run the pipeline.
#[derive(Args, Debug, Default, Clone)]
pub struct QueryArgs {
    /// Raw query string, e.g. "period=7d&metrics=sessions,users"
    #[arg(long, short)]
    pub query: Option<String>,

    /// Bypass the cache read (the result is still stored)
    #[arg(long)]
    pub refresh: bool,

    /// Preset window: 7d | 30d | 90d
    #[arg(long)]
    pub period: Option<String>,

    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub end_date: Option<String>,

    /// Comma-separated metric names (max 5)
    #[arg(long, short)]
    pub metrics: Option<String>,

    /// Number of weeks for the trends view
    #[arg(long)]
    pub weeks: Option<u32>,
}

impl QueryArgs {
    /// `--query` first, then each flag appended so flags win.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .query
            .as_deref()
            .map(|q| {
                insight_core::application::request::parse_query(q)
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if self.refresh {
            params.push(("refresh".into(), "true".into()));
        }
        let flags = [
            ("period", self.period.clone()),
            ("startDate", self.start_date.clone()),
            ("endDate", self.end_date.clone()),
            ("metrics", self.metrics.clone()),
            ("weeks", self.weeks.map(|w| w.to_string())),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                params.push((key.to_string(), value));
            }
        }
        params
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📡 Runs one endpoint and prints the response envelope (JSON)
    Fetch {
        /// overview | anomalies | trends
        endpoint: String,

        #[command(flatten)]
        query: QueryArgs,

        /// Also write the envelope to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 🚨 Anomaly report as a table
    Report {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// 🔁 Replays a file of `endpoint?query` lines through one shared pipeline
    Replay {
        #[arg(long, short)]
        file: PathBuf,
    },

    /// 📏 Effective thresholds and polarity per metric
    Thresholds,

    /// 🎲 Prints a demo payload, without touching the source
    Demo {
        /// overview | anomalies | trends
        endpoint: String,

        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        query: QueryArgs,
    },
}
