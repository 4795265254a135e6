//! Round orchestration — fan-out over hosts, fan-in of results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

use fleetwatch_core::{FleetConfig, ScanResult, ServerConfig, TaskConfig};
use fleetwatch_exec::CommandRunner;
use fleetwatch_notify::{Alerter, AlertPayload};

/// Aggregate outcome of one round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// Results drained — one per server × task pair.
    pub results: usize,
    pub failures: usize,
    pub elapsed: Duration,
}

/// Run one full inspection round: every task on every server, all
/// bounded by one shared deadline derived from `global.timeout`.
///
/// Hosts run in parallel; tasks within a host run strictly in
/// declaration order, so a stuck command blocks only that host's
/// remaining tasks. Failures are printed and alerted as they arrive,
/// never batched to round end.
pub async fn run_round<R, A>(config: &FleetConfig, runner: Arc<R>, alerter: &A) -> RoundReport
where
    R: CommandRunner + 'static,
    A: Alerter,
{
    let started = Instant::now();
    let deadline = started + Duration::from_secs(config.global.timeout);

    // Sized for every result the round can produce, so producers
    // never block on the sink under normal conditions.
    let (tx, mut rx) = mpsc::channel::<ScanResult>(config.result_count().max(1));

    let mut workers = JoinSet::new();
    for server in config.servers.clone() {
        let runner = runner.clone();
        let tasks = config.tasks.clone();
        let tx = tx.clone();
        workers.spawn(host_worker(runner, server, tasks, deadline, tx));
    }
    // Each worker owns a sender clone; once ours is dropped the sink
    // reports closed only after every worker has finished, so the
    // drain below cannot terminate early and drop results.
    drop(tx);

    let mut results = 0usize;
    let mut failures = 0usize;
    while let Some(result) = rx.recv().await {
        results += 1;
        if result.success {
            println!(
                "{} [{}] {}: {}",
                result.symbol(),
                result.host,
                result.task,
                result.excerpt()
            );
        } else {
            failures += 1;
            println!(
                "{} [{}] {}: {}",
                result.symbol(),
                result.host,
                result.task,
                result.output
            );
            let payload = AlertPayload::new(&result.host, &result.task, &result.output);
            if let Err(e) = alerter.alert(&payload).await {
                warn!(host = %result.host, task = %result.task, error = %e, "alert delivery failed");
            }
        }
    }

    // Reap the (already finished) workers.
    while workers.join_next().await.is_some() {}

    let elapsed = started.elapsed();
    println!("--- round finished in {elapsed:.2?}, {failures} failures ---");
    info!(
        results,
        failures,
        elapsed_ms = elapsed.as_millis() as u64,
        "round finished"
    );

    RoundReport {
        results,
        failures,
        elapsed,
    }
}

/// One host worker: this host's tasks, strictly in declaration order,
/// each flattened into exactly one `ScanResult`.
async fn host_worker<R: CommandRunner>(
    runner: Arc<R>,
    server: ServerConfig,
    tasks: Vec<TaskConfig>,
    deadline: Instant,
    tx: mpsc::Sender<ScanResult>,
) {
    for task in &tasks {
        let result = match runner.run(deadline, &server, &task.command).await {
            Ok(output) => ScanResult::ok(&server.host, &task.name, output),
            Err(e) => ScanResult::failed(&server.host, &task.name, e.diagnostic()),
        };
        if tx.send(result).await.is_err() {
            // Receiver gone; the round is being torn down.
            return;
        }
    }
}
