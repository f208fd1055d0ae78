//! OpenAI-compatible chat-completions client.
//!
//! Implements `CompletionGateway` for Azure OpenAI deployments
//! (`{endpoint}/openai/deployments/{deployment}/chat/completions`) and for
//! plain OpenAI-style endpoints (`{endpoint}/chat/completions`).

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::ClientConfig;
