//! fleetwatch-monitor — the inspection loop.
//!
//! ```text
//! Scheduler
//!   └── run() — immediate first round, then one round per tick,
//!       strictly sequential, until the shutdown signal
//!
//! run_round()
//!   ├── one shared deadline for the whole round
//!   ├── one worker per server (tasks in sequence within a worker)
//!   ├── bounded mpsc sink sized to hosts × tasks
//!   └── drain: per-result console line, per-failure alert,
//!       end-of-round summary
//! ```

pub mod round;
pub mod scheduler;

pub use round::{run_round, RoundReport};
pub use scheduler::{Scheduler, DEFAULT_INTERVAL};
