//! CompletionGateway implementation for OpenAiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{Completion, CompletionGateway, GatewayError, Message};

use super::client::{error_for_status, OpenAiClient};

#[async_trait]
impl CompletionGateway for OpenAiClient {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, GatewayError> {
        let body = self.build_request_body(transcript);

        debug!(
            model = %self.config.deployment,
            provider = ?self.config.provider,
            messages = transcript.len(),
            "chat completion request"
        );

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::ParseError(e.to_string())
            }
        })?;

        self.parse_response(json)
    }

    fn name(&self) -> &str {
        &self.config.deployment
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::NetworkError(err.to_string())
    }
}
