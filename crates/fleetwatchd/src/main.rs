//! fleetwatchd — the fleetwatch daemon.
//!
//! Single binary that assembles the inspection pipeline:
//! - Config (servers, tasks, global knobs)
//! - SSH executor
//! - Webhook notifier
//! - Round scheduler
//!
//! # Usage
//!
//! ```text
//! fleetwatchd --config /etc/fleetwatch/fleetwatch.toml
//! ```
//!
//! Runs until externally terminated; the only fatal error is an
//! unloadable configuration at startup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use fleetwatch_core::FleetConfig;
use fleetwatch_exec::SshExecutor;
use fleetwatch_monitor::{run_round, Scheduler};
use fleetwatch_notify::Notifier;

#[derive(Parser)]
#[command(name = "fleetwatchd", about = "Periodic SSH fleet inspection daemon")]
struct Cli {
    /// Path to the fleet configuration file.
    #[arg(long, default_value = "/etc/fleetwatch/fleetwatch.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleetwatch=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // An unloadable config is the only process-fatal error.
    let config = FleetConfig::from_file(&cli.config)?;
    info!(
        path = ?cli.config,
        servers = config.servers.len(),
        tasks = config.tasks.len(),
        interval_secs = config.global.interval,
        timeout_secs = config.global.timeout,
        "configuration loaded"
    );

    let runner = Arc::new(SshExecutor::new());
    let notifier = Notifier::new(config.global.webhook.clone());
    let scheduler = Scheduler::new(config.global.interval);

    // Graceful shutdown on Ctrl-C.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    scheduler
        .run(shutdown_rx, || {
            let config = &config;
            let notifier = &notifier;
            let runner = runner.clone();
            async move {
                run_round(config, runner, notifier).await;
            }
        })
        .await;

    info!("fleetwatch daemon stopped");
    Ok(())
}
