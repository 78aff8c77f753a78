//! Replica controller - closed-loop autoscaling driver
//!
//! Drives synthetic load at a target service, asks the prediction
//! service for a replica count, applies it through the orchestrator,
//! and appends one observation per cycle to the log.

use anyhow::Result;
use clap::Parser;
use controller_lib::ControlLoop;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

/// Closed-loop replica autoscaling controller
#[derive(Parser)]
#[command(name = "replica-controller")]
#[command(author, version, about = "Closed-loop replica autoscaling controller", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "CONTROLLER_CONFIG_FILE")]
    pub config: Option<String>,

    /// Target URL the load generator drives
    #[arg(long)]
    pub target_url: Option<String>,

    /// Deployment to scale
    #[arg(long)]
    pub workload: Option<String>,

    /// Namespace of the scaled deployment
    #[arg(long)]
    pub namespace: Option<String>,

    /// Prediction service address
    #[arg(long)]
    pub predictor_url: Option<String>,

    /// Observation log path
    #[arg(long)]
    pub log_path: Option<String>,

    /// Pacing delay between cycles, in seconds
    #[arg(long)]
    pub pace_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();
    let config = config::load(&cli)?;
    info!(
        workload = %config.workload,
        namespace = %config.namespace,
        predictor = %config.predictor_url,
        "controller configured"
    );

    let controller = ControlLoop::new(&config)?;
    let summary = controller.run().await?;

    info!(
        completed = summary.completed,
        aborted = summary.aborted,
        scale_failures = summary.scale_failures,
        "run finished"
    );
    Ok(())
}
