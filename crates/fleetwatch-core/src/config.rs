//! fleetwatch.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full parsed configuration file.
///
/// Loaded once at startup; a read or parse failure is fatal (the
/// daemon does not start without a usable config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub global: GlobalConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// Process-wide knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Per-round budget in seconds. Every command started in a round
    /// shares the single deadline derived from this.
    pub timeout: u64,
    /// Seconds between rounds. Zero falls back to a safe default at
    /// the scheduler.
    pub interval: u64,
    /// Alert webhook URL. Empty disables alerting.
    #[serde(default)]
    pub webhook: String,
}

/// One remote host to inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    /// Path to a private key. Tried before the password when set.
    #[serde(default)]
    pub key_path: String,
    #[serde(default)]
    pub password: String,
}

impl ServerConfig {
    /// `host:port` form used for dialing and log lines.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One diagnostic command, run on every server each round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    pub command: String,
}

fn default_ssh_port() -> u16 {
    22
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FleetConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Total results one round produces: one per server × task pair.
    pub fn result_count(&self) -> usize {
        self.servers.len() * self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[global]
timeout = 30
interval = 300
webhook = "https://hooks.example.com/alerts"

[[servers]]
host = "10.0.0.1"
port = 2222
user = "ops"
key_path = "/etc/fleetwatch/id_ed25519"

[[servers]]
host = "10.0.0.2"
user = "ops"
password = "hunter2"

[[tasks]]
name = "uptime"
command = "uptime"

[[tasks]]
name = "disk"
command = "df -h /"
"#;
        let config: FleetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.global.timeout, 30);
        assert_eq!(config.global.interval, 300);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].port, 2222);
        assert_eq!(config.tasks.len(), 2);
        assert_eq!(config.result_count(), 4);
    }

    #[test]
    fn port_defaults_to_22() {
        let toml_str = r#"
[global]
timeout = 10
interval = 60

[[servers]]
host = "10.0.0.2"
user = "ops"
password = "hunter2"
"#;
        let config: FleetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.servers[0].port, 22);
        assert_eq!(config.servers[0].key_path, "");
        assert_eq!(config.servers[0].address(), "10.0.0.2:22");
    }

    #[test]
    fn webhook_and_lists_default_empty() {
        let toml_str = r#"
[global]
timeout = 10
interval = 60
"#;
        let config: FleetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.global.webhook, "");
        assert!(config.servers.is_empty());
        assert!(config.tasks.is_empty());
        assert_eq!(config.result_count(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = FleetConfig::from_file(Path::new("/nonexistent/fleetwatch.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let result: Result<FleetConfig, _> = toml::from_str("not = [valid");
        assert!(result.is_err());
    }
}
