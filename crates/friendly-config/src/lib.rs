//! Friendly Agent configuration.
//!
//! TOML-based configuration layered with a `.env` file and process
//! environment variables. All sections use serde defaults so a partial
//! (or missing) config file works out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use friendly_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    AgentConfig, GatewayConfig, LogLevel, LoggingConfig, PersonaConfig, ProviderKind, WebConfig,
};

use std::path::Path;

use friendly_common::ConfigError;

/// Load the full configuration.
///
/// Reads `.env`, then the TOML file (`path` if given, otherwise the platform
/// default, which is created on first run), overlays the gateway settings
/// from the environment and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    env::load_dotenv();

    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    env::apply_env(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
///
/// The API key is masked.
pub fn config_to_json(config: &AgentConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.gateway.api_key.is_empty() {
        redacted.gateway.api_key = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
