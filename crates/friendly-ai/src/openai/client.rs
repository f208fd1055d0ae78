//! Chat-completions client struct, request building, and response parsing.

use friendly_common::ConfigError;
use friendly_config::ProviderKind;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::{Completion, GatewayError, Message, TokenUsage};

use super::config::ClientConfig;

/// Longest slice of an error body kept in a `GatewayError`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// OpenAI-compatible chat-completions client.
pub struct OpenAiClient {
    pub(crate) config: ClientConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config", &self.config)
            .field("url", &self.url)
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client. The credential and endpoint must be non-empty.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let (key_hint, endpoint_hint) = match config.provider {
            ProviderKind::Azure => ("AZURE_OPENAI_API_KEY", "AZURE_OPENAI_ENDPOINT"),
            ProviderKind::OpenAi => ("OPENAI_API_KEY", "OPENAI_BASE_URL"),
        };

        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(format!(
                "set {key_hint} or gateway.api_key"
            )));
        }
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint(format!(
                "set {endpoint_hint} or gateway.endpoint"
            )));
        }
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{endpoint} is not an http(s) URL"
            )));
        }

        let url = api_url(&config);
        let headers = auth_headers(&config)?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidEndpoint(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            url,
            headers,
        })
    }

    /// Build the JSON request body for the chat-completions API.
    pub(crate) fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let msgs: Vec<_> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role,
                    "content": msg.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({ "messages": msgs });

        // Azure selects the model through the deployment in the URL.
        if self.config.provider == ProviderKind::OpenAi {
            body["model"] = serde_json::json!(self.config.deployment);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }

    /// Parse a non-streaming response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<Completion, GatewayError> {
        let choice = &json["choices"][0];
        if choice.is_null() {
            return Err(GatewayError::ParseError("response contained no choices".into()));
        }

        let content = match choice["message"]["content"].as_str() {
            Some(content) => content.to_string(),
            None if choice["finish_reason"] == "content_filter" => {
                return Err(GatewayError::ApiError(
                    "response was blocked by the content filter".into(),
                ));
            }
            None => {
                return Err(GatewayError::ParseError(
                    "response contained no message content".into(),
                ));
            }
        };

        let usage = TokenUsage {
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        };

        Ok(Completion { content, usage })
    }
}

/// Full request URL for the configured provider.
pub(crate) fn api_url(config: &ClientConfig) -> String {
    let base = config.endpoint.trim().trim_end_matches('/');
    match config.provider {
        ProviderKind::Azure => format!(
            "{base}/openai/deployments/{}/chat/completions?api-version={}",
            config.deployment, config.api_version
        ),
        ProviderKind::OpenAi => format!("{base}/chat/completions"),
    }
}

/// Auth and content headers for the configured provider.
pub(crate) fn auth_headers(config: &ClientConfig) -> Result<HeaderMap, ConfigError> {
    let invalid = |_| ConfigError::InvalidCredential("API key contains invalid characters".into());

    let mut headers = HeaderMap::new();
    match config.provider {
        ProviderKind::Azure => {
            let mut value = HeaderValue::from_str(config.api_key.trim()).map_err(invalid)?;
            value.set_sensitive(true);
            headers.insert("api-key", value);
        }
        ProviderKind::OpenAi => {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
                .map_err(invalid)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Map a non-success HTTP status and its body to a `GatewayError`.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> GatewayError {
    let detail = error_detail(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Authentication(format!("HTTP {status}: {detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::ApiError(format!("HTTP {status}: {detail}")),
    }
}

/// Prefer the service's `error.message`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    message.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
