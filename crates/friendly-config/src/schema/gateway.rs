//! Completion gateway connection settings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which flavor of the chat-completions API to speak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Azure OpenAI deployment (`api-key` header, deployment in the URL).
    #[default]
    Azure,
    /// OpenAI-compatible endpoint (`Authorization: Bearer`, model in the body).
    OpenAi,
}

/// Completion gateway configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub provider: ProviderKind,
    /// Base URL of the service. Empty means "not configured".
    pub endpoint: String,
    pub api_key: String,
    /// Azure deployment name, or the model id for OpenAI.
    pub deployment: String,
    /// Azure `api-version` query parameter.
    pub api_version: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    /// Whole-request timeout in seconds (valid range: 1-600).
    pub request_timeout: u32,
    /// Connect timeout in seconds (valid range: 1-120).
    pub connect_timeout: u32,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
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

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Azure,
            endpoint: String::new(),
            api_key: String::new(),
            deployment: "gpt-4o".into(),
            api_version: "2024-05-01-preview".into(),
            max_tokens: None,
            temperature: None,
            request_timeout: 120,
            connect_timeout: 10,
        }
    }
}
