//! Full configuration validation.
//!
//! Validates numeric ranges per section and collects every error into a
//! single `ConfigError`.

mod helpers;


use crate::schema::AgentConfig;
use friendly_common::ConfigError;

use helpers::{validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &AgentConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_gateway(&mut errors, config);
    validate_agent(&mut errors, config);
    validate_web(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_gateway(errors: &mut Vec<String>, config: &AgentConfig) {
    let gateway = &config.gateway;
    validate_range(errors, "gateway.request_timeout", gateway.request_timeout, 1, 600);
    validate_range(errors, "gateway.connect_timeout", gateway.connect_timeout, 1, 120);
    if let Some(max_tokens) = gateway.max_tokens {
        validate_range(errors, "gateway.max_tokens", max_tokens, 1, 128_000);
    }
    if let Some(temperature) = gateway.temperature {
        validate_range_f64(errors, "gateway.temperature", temperature, 0.0, 2.0);
    }
    if gateway.deployment.trim().is_empty() {
        errors.push("gateway.deployment must not be empty".into());
    }
}

fn validate_agent(errors: &mut Vec<String>, config: &AgentConfig) {
    validate_range(
        errors,
        "agent.context_window",
        config.agent.context_window,
        0,
        10_000,
    );
}

fn validate_web(errors: &mut Vec<String>, config: &AgentConfig) {
    validate_range(errors, "web.port", config.web.port, 1, 65535);
    validate_range(errors, "web.idle_timeout", config.web.idle_timeout, 60, 86_400);
    validate_range(errors, "web.reap_interval", config.web.reap_interval, 1, 3600);
}
