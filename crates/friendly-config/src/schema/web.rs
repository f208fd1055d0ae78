use serde::{Deserialize, Serialize};

/// WebSocket chat server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    /// Listen port (valid range: 1-65535).
    pub port: u32,
    /// Seconds without activity after which a session is reaped
    /// (valid range: 60-86400).
    pub idle_timeout: u32,
    /// Seconds between reaper sweeps (valid range: 1-3600).
    pub reap_interval: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            idle_timeout: 1800,
            reap_interval: 60,
        }
    }
}

impl WebConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
