//! Executor error types.

use thiserror::Error;

/// Errors from one remote command attempt.
///
/// The round orchestrator flattens all of these into a failed
/// `ScanResult` — only the text survives above the executor boundary.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no usable credentials for {user}@{host}")]
    NoCredentials { user: String, host: String },

    #[error("authentication rejected for {user}@{host}")]
    AuthRejected { user: String, host: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection to {addr} timed out after {secs}s")]
    ConnectTimeout { addr: String, secs: u64 },

    #[error("ssh protocol error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("remote refused to start command")]
    CommandRefused,

    #[error("command exited with status {status}")]
    CommandFailed {
        status: u32,
        /// Partial output captured before the failure.
        output: String,
    },

    #[error("canceled: round deadline exceeded")]
    DeadlineExceeded,
}

impl ExecError {
    /// Diagnostic text for the flattened `ScanResult`. For command
    /// failures the captured output rides along, since callers above
    /// the executor never see the structured variant.
    pub fn diagnostic(&self) -> String {
        match self {
            ExecError::CommandFailed { output, .. } if !output.trim().is_empty() => {
                format!("{}: {}", self, output.trim())
            }
            _ => self.to_string(),
        }
    }
}
