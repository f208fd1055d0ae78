//! Chat-completions client configuration.

use std::fmt;
use std::time::Duration;

use friendly_config::{GatewayConfig, ProviderKind};

/// Chat-completions client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    pub provider: ProviderKind,
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        provider: ProviderKind,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-05-01-preview".to_string(),
            max_tokens: None,
            temperature: None,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl From<&GatewayConfig> for ClientConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            provider: config.provider,
            endpoint: config.endpoint.trim().to_string(),
            api_key: config.api_key.trim().to_string(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(u64::from(config.request_timeout)),
            connect_timeout: Duration::from_secs(u64::from(config.connect_timeout)),
        }
    }
}
