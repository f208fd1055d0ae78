//! Environment overlay for gateway settings.
//!
//! Credentials usually live in the environment (or a `.env` file) rather
//! than the TOML file. Non-empty variables win over file values.

use tracing::debug;

use crate::schema::{AgentConfig, ProviderKind};

pub const AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const AZURE_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Load variables from a `.env` file in the current directory or a parent.
///
/// Variables already present in the process environment are kept.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(e) => debug!("no .env file loaded: {e}"),
    }
}

/// Overlay gateway settings from the process environment.
pub fn apply_env(config: &mut AgentConfig) {
    apply_env_with(config, |key| std::env::var(key).ok());
}

/// Overlay gateway settings using `lookup` to resolve variables.
///
/// Resolution order:
/// 1. `AZURE_OPENAI_API_KEY` / `AZURE_OPENAI_ENDPOINT` select the Azure provider
/// 2. otherwise `OPENAI_API_KEY` selects OpenAI, unless the file already
///    configured an Azure key
pub fn apply_env_with(config: &mut AgentConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let gateway = &mut config.gateway;

    let azure_key = var(AZURE_API_KEY);
    let azure_endpoint = var(AZURE_ENDPOINT);
    if azure_key.is_some() || azure_endpoint.is_some() {
        gateway.provider = ProviderKind::Azure;
        if let Some(key) = azure_key {
            gateway.api_key = key;
        }
        if let Some(endpoint) = azure_endpoint {
            gateway.endpoint = endpoint;
        }
        debug!("gateway configured from Azure environment");
    } else if let Some(key) = var(OPENAI_API_KEY) {
        if gateway.api_key.is_empty() || gateway.provider == ProviderKind::OpenAi {
            gateway.provider = ProviderKind::OpenAi;
            gateway.api_key = key;
            debug!("gateway configured from OpenAI environment");
        }
    }

    if let Some(version) = var(AZURE_API_VERSION) {
        gateway.api_version = version;
    }
    if let Some(deployment) = var(AZURE_DEPLOYMENT) {
        gateway.deployment = deployment;
    }

    if gateway.provider == ProviderKind::OpenAi {
        if let Some(url) = var(OPENAI_BASE_URL) {
            gateway.endpoint = url;
        } else if gateway.endpoint.is_empty() {
            gateway.endpoint = DEFAULT_OPENAI_BASE_URL.into();
        }
    }
}
