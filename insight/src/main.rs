// insight/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug insight fetch overview ... to see cache hits and fetches.
    // Logs go to stderr, stdout only carries payloads.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_dir = cli.project_dir;

    match cli.command {
        // --- USE CASE: ONE ENDPOINT, JSON ENVELOPE ---
        Commands::Fetch {
            endpoint,
            query,
            output,
        } => commands::fetch::execute(&project_dir, &endpoint, &query, output).await?,

        // --- USE CASE: ANOMALY TABLE ---
        Commands::Report { query } => commands::report::execute(&project_dir, &query).await?,

        // --- USE CASE: BATCH THROUGH A SHARED CACHE ---
        Commands::Replay { file } => commands::replay::execute(&project_dir, &file).await?,

        // --- USE CASE: CONFIG INTROSPECTION ---
        Commands::Thresholds => commands::thresholds::execute(&project_dir)?,

        // --- USE CASE: DEMO PREVIEW ---
        Commands::Demo {
            endpoint,
            seed,
            query,
        } => commands::demo::execute(&project_dir, &endpoint, seed, &query)?,
    }

    Ok(())
}
