//! Conversation core for Friendly Agent.
//!
//! Provides:
//! - the transcript types sent to a chat-completion service
//! - the `CompletionGateway` trait and an OpenAI-compatible HTTP client
//!   (Azure OpenAI and OpenAI flavors)
//! - `ConversationSession`, which owns one append-only transcript
//! - `SessionRegistry`, which isolates concurrent users in one process
//! - token usage tracking, plus scripted and echo gateways for tests and
//!   offline runs

pub mod mock;
pub mod openai;
pub mod registry;
pub mod session;
pub mod token_tracker;

use std::sync::Arc;

use async_trait::async_trait;
use friendly_common::{AgentError, ConfigError};
use friendly_config::GatewayConfig;

pub use mock::{EchoGateway, ScriptedGateway};
pub use openai::{ClientConfig, OpenAiClient};
pub use registry::{GatewayFactory, SessionRegistry, SharedSession};
pub use session::{ChatError, ConversationSession};
pub use token_tracker::TokenTracker;

/// A text-generation service that turns a transcript into the next
/// assistant message.
///
/// Implementations are stateless across calls: the whole context arrives
/// with every request.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, GatewayError>;

    /// Short label for logs (model or deployment name).
    fn name(&self) -> &str {
        "gateway"
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A successful gateway reply.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Why a completion call failed. Callers treat every variant the same way
/// and only surface the message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("request timeout")]
    Timeout,
}

impl From<GatewayError> for AgentError {
    fn from(err: GatewayError) -> Self {
        AgentError::Gateway(err.to_string())
    }
}

/// Build the HTTP gateway described by `config`.
///
/// Fails when the credential or endpoint is missing.
pub fn gateway_from_config(
    config: &GatewayConfig,
) -> Result<Arc<dyn CompletionGateway>, ConfigError> {
    let client = OpenAiClient::new(ClientConfig::from(config))?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn token_usage_total_saturates() {
        let usage = TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 5,
        };
        assert_eq!(usage.total_tokens(), u64::MAX);
    }

    #[test]
    fn gateway_error_becomes_agent_gateway_error() {
        let err: AgentError = GatewayError::NetworkError("connection reset".into()).into();
        assert!(matches!(err, AgentError::Gateway(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn gateway_from_config_requires_credentials() {
        let config = GatewayConfig::default();
        let err = gateway_from_config(&config).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn gateway_from_config_builds_client() {
        let config = GatewayConfig {
            endpoint: "https://example.openai.azure.com".into(),
            api_key: "key".into(),
            ..GatewayConfig::default()
        };
        let gateway = gateway_from_config(&config).unwrap();
        assert_eq!(gateway.name(), "gpt-4o");
    }
}
