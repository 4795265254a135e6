//! Round scheduling — one sequential loop, rounds never overlap.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Fallback when the configured interval is unusable. A misconfigured
/// interval must not stop monitoring.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Fires inspection rounds: once immediately at startup, then on every
/// interval tick until the shutdown signal.
///
/// The round future is awaited on the scheduler's own task, so rounds
/// are strictly sequential. Ticks are wall-clock; ticks that fire
/// while a round is still running are skipped, never queued up.
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    /// Interval in whole seconds; zero substitutes [`DEFAULT_INTERVAL`].
    pub fn new(interval_seconds: u64) -> Self {
        let interval = if interval_seconds == 0 {
            DEFAULT_INTERVAL
        } else {
            Duration::from_secs(interval_seconds)
        };
        Self { interval }
    }

    /// Custom interval (tests use sub-second ones).
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the scheduling loop until `shutdown` fires.
    ///
    /// `round` is invoked once per trigger; whatever it reports or
    /// swallows internally, the loop keeps going — a failing round
    /// never stops future rounds.
    pub async fn run<F, Fut>(&self, mut shutdown: watch::Receiver<bool>, mut round: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(interval_secs = self.interval.as_secs(), "monitor started");
        println!(
            "🚀 fleetwatch started, inspecting every {}s",
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately, so operators see
        // results at startup instead of waiting a full interval.
        ticker.tick().await;
        round().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("scheduled round triggered");
                    println!("\n⏰ scheduled round triggered");
                    round().await;
                }
                _ = shutdown.changed() => {
                    info!("monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn zero_interval_substitutes_default() {
        let scheduler = Scheduler::new(0);
        assert_eq!(scheduler.interval(), DEFAULT_INTERVAL);
    }

    #[test]
    fn positive_interval_is_kept() {
        let scheduler = Scheduler::new(300);
        assert_eq!(scheduler.interval(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn first_round_fires_immediately() {
        let scheduler = Scheduler::with_interval(Duration::from_secs(3600));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let rounds = Arc::new(AtomicUsize::new(0));

        let counter = rounds.clone();
        let loop_handle = tokio::spawn(async move {
            scheduler
                .run(shutdown_rx, move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .await;
        });

        // Well before the hour-long interval elapses.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rounds.load(Ordering::SeqCst), 1);

        shutdown_tx.send(true).unwrap();
        loop_handle.await.unwrap();
    }

    #[tokio::test]
    async fn ticks_keep_firing_until_shutdown() {
        let scheduler = Scheduler::with_interval(Duration::from_millis(40));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let rounds = Arc::new(AtomicUsize::new(0));

        let counter = rounds.clone();
        let loop_handle = tokio::spawn(async move {
            scheduler
                .run(shutdown_rx, move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
        loop_handle.await.unwrap();

        // Immediate round plus ~3 ticks; bounds are loose to keep the
        // test calm under load.
        let count = rounds.load(Ordering::SeqCst);
        assert!((2..=6).contains(&count), "got {count} rounds");
    }

    #[tokio::test]
    async fn rounds_never_overlap_even_when_overrunning() {
        let scheduler = Scheduler::with_interval(Duration::from_millis(20));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicUsize::new(0));

        let in_flight_c = in_flight.clone();
        let overlapped_c = overlapped.clone();
        let loop_handle = tokio::spawn(async move {
            scheduler
                .run(shutdown_rx, move || {
                    let in_flight = in_flight_c.clone();
                    let overlapped = overlapped_c.clone();
                    async move {
                        if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlapped.fetch_add(1, Ordering::SeqCst);
                        }
                        // Each round outruns the interval.
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        shutdown_tx.send(true).unwrap();
        loop_handle.await.unwrap();

        assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_ends_the_loop() {
        let scheduler = Scheduler::with_interval(Duration::from_millis(30));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_handle = tokio::spawn(async move {
            scheduler.run(shutdown_rx, || async {}).await;
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), loop_handle)
            .await
            .expect("scheduler loop did not stop")
            .unwrap();
    }
}
