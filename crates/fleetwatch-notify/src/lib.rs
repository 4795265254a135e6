//! fleetwatch-notify — webhook alert delivery.
//!
//! One outbound POST per failed task, fired from the round aggregation
//! loop as failures arrive (not batched at round end). Delivery is
//! bounded by a short fixed timeout so a slow alert endpoint cannot
//! stall monitoring, and a delivery failure is only ever a log line —
//! it never affects the round's accounting.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Total budget (connect + request) for one webhook delivery.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(3);

/// Alert delivery errors. Logged by the caller, never escalated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(u16),
}

/// One failed task, rendered into the alert body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPayload {
    pub host: String,
    pub task: String,
    pub error: String,
}

impl AlertPayload {
    pub fn new(
        host: impl Into<String>,
        task: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            task: task.into(),
            error: error.into(),
        }
    }

    /// Human-readable alert body.
    pub fn render(&self) -> String {
        format!(
            "server: {}\ntask: {}\nerror: {}",
            self.host, self.task, self.error
        )
    }
}

/// Wire envelope expected by the webhook endpoint.
#[derive(Serialize)]
struct Envelope {
    msgtype: &'static str,
    text: TextBody,
}

#[derive(Serialize)]
struct TextBody {
    content: String,
}

impl Envelope {
    fn text(content: String) -> Self {
        Self {
            msgtype: "text",
            text: TextBody { content },
        }
    }
}

/// Seam between the round aggregator and alert delivery — tests
/// substitute a recording fake to verify the per-failure contract.
pub trait Alerter: Send + Sync {
    fn alert(&self, payload: &AlertPayload) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Webhook-backed alerter.
pub struct Notifier {
    webhook: String,
    client: reqwest::Client,
}

impl Notifier {
    /// An empty `webhook` disables alerting — every `alert` call
    /// becomes a no-op returning `Ok`.
    pub fn new(webhook: impl Into<String>) -> Self {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(NOTIFY_TIMEOUT)
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .expect("webhook client construction");
        Self {
            webhook: webhook.into(),
            client,
        }
    }

    pub async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        if self.webhook.is_empty() {
            return Ok(());
        }

        let body = Envelope::text(format!("🚨 [fleetwatch alert]\n{message}"));
        let response = self.client.post(&self.webhook).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        debug!(webhook = %self.webhook, "alert delivered");
        Ok(())
    }
}

impl Alerter for Notifier {
    async fn alert(&self, payload: &AlertPayload) -> Result<(), NotifyError> {
        self.notify(&payload.render()).await
    }
}
