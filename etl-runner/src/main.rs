//! ETL Runner
//!
//! Runs the retail sync job under a supervisor that retries forever.
//!
//! `etl-runner` (or `etl-runner supervise`) starts the supervisor loop and
//! stops on SIGINT/SIGTERM. `etl-runner once` performs a single run and
//! exits non-zero if it failed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use etl_runner::config::Config;
use etl_runner::scheduler::Supervisor;
use etl_runner::service::{EtlJob, JobRunner, RetailSyncJob};
use etl_runner::signal::shutdown_signal;

#[derive(Parser)]
#[command(name = "etl-runner")]
#[command(about = "Supervised PostgreSQL to ClickHouse ETL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ETL job forever, retrying after failures (default)
    Supervise,
    /// Run the ETL job once and exit
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etl_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ETL runner");

    let config = load_config()?;
    info!(
        "Loaded configuration: success_delay={:?}, failure_delay={:?}, backoff={:?}, job_timeout={:?}",
        config.success_delay, config.failure_delay, config.backoff, config.job_timeout
    );

    let job: Arc<dyn EtlJob> = Arc::new(RetailSyncJob::new());
    let runner = JobRunner::new(job, config.job_timeout);

    match cli.command.unwrap_or(Commands::Supervise) {
        Commands::Supervise => {
            let mut supervisor = Supervisor::new(runner, config.retry_policy());
            let runs = supervisor.run_until(shutdown_signal()).await;
            info!("ETL runner stopped after {} run(s)", runs);
            Ok(())
        }
        Commands::Once => {
            let outcome = runner.run_once().await;
            match outcome.diagnostic() {
                None => {
                    info!("ETL run {} succeeded in {:.2?}", outcome.run_id, outcome.duration());
                    Ok(())
                }
                Some(diagnostic) => anyhow::bail!("ETL failed: {}", diagnostic),
            }
        }
    }
}

/// Loads and validates the supervisor configuration
fn load_config() -> Result<Config> {
    let config = Config::from_env();
    config.validate()?;
    Ok(config)
}
