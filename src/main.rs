mod client;
mod config;
mod form;
mod input;
mod models;
mod overlay;
mod picker;
mod selector;
mod telemetry;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use client::HttpSubmitter;
use config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "apply")]
#[command(about = "Job application form - fill in your details and submit your CV")]
struct Cli {
    /// Path to a JSON config file (endpoint, jobPositions, logLevel)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Submission endpoint, overrides the config file
    #[arg(short, long, env = "APPLY_ENDPOINT")]
    endpoint: Option<String>,

    /// Where to write logs (the terminal is used by the form)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.with_endpoint(cli.endpoint)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let log_file = cli.log_file.unwrap_or_else(telemetry::default_log_path);
    telemetry::init(&log_file, &config.log_level)?;
    tracing::info!(
        endpoint = %config.endpoint,
        positions = config.job_positions.len(),
        "starting application form"
    );

    let submitter = HttpSubmitter::new(&config.endpoint)
        .context("Failed to set up the submission client")?;
    tracing::debug!(endpoint = %submitter.endpoint(), "submission client ready");

    tui::run_form(config.job_positions, Arc::new(submitter))
}
