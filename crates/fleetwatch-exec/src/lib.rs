//! fleetwatch-exec — SSH command execution for fleetwatch.
//!
//! One `execute()` call is one state machine:
//!
//! ```text
//! SshExecutor
//!   ├── candidates() — ordered credentials (key first, then password)
//!   ├── connect + authenticate, bounded by a 5s connect timeout
//!   ├── exec channel, stdout+stderr into one capture buffer
//!   └── race: command completion vs. the shared round deadline
//!        └── deadline first → SIGKILL the session, close, disconnect
//! ```
//!
//! The connection and session are released on every exit path. The
//! round orchestrator consumes this through the `CommandRunner` trait
//! so tests can substitute a recording fake.

pub mod auth;
pub mod client;
pub mod error;

pub use client::{CommandRunner, SshExecutor, CONNECT_TIMEOUT};
pub use error::ExecError;
