//! Shared types used across fleetwatch crates.

use serde::{Deserialize, Serialize};

/// Outcome of one command attempt on one host.
///
/// Produced by a host worker, consumed exactly once by the round
/// aggregator, then discarded. Unreachable hosts, rejected
/// credentials, nonzero exits, and deadline expiry all land here in
/// the same shape — `success = false` with the diagnostic in `output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub host: String,
    pub task: String,
    pub success: bool,
    /// Captured command output on success, error text on failure.
    pub output: String,
}

impl ScanResult {
    pub fn ok(host: impl Into<String>, task: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            task: task.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(
        host: impl Into<String>,
        task: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            task: task.into(),
            success: false,
            output: error.into(),
        }
    }

    /// First non-empty line of the output, for one-line success logs.
    pub fn excerpt(&self) -> &str {
        self.output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    pub fn symbol(&self) -> &'static str {
        if self.success { "✅" } else { "❌" }
    }
}
