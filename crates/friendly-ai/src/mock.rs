//! Gateways that never touch the network.
//!
//! `ScriptedGateway` replays queued replies and records every transcript it
//! receives, for tests. `EchoGateway` answers `You said: <text>` and backs
//! the `--echo` mode of the binaries.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Completion, CompletionGateway, GatewayError, Message, Role, TokenUsage};

/// Replays queued replies in order.
///
/// Usage is reported as one input token per transcript entry and one output
/// token per whitespace-separated word of the reply.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    received: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub fn push_failure(&self, error: GatewayError) {
        lock(&self.replies).push_back(Err(error));
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    pub fn with_failure(self, error: GatewayError) -> Self {
        self.push_failure(error);
        self
    }

    /// Every transcript received so far, oldest first.
    pub fn received(&self) -> Vec<Vec<Message>> {
        lock(&self.received).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.received).len()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, GatewayError> {
        lock(&self.received).push(transcript.to_vec());

        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::ApiError("no scripted reply left".into())))?;

        let usage = TokenUsage {
            input_tokens: transcript.len() as u64,
            output_tokens: reply.split_whitespace().count() as u64,
        };
        Ok(Completion {
            content: reply,
            usage,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Repeats the latest user entry back.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoGateway;

#[async_trait]
impl CompletionGateway for EchoGateway {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, GatewayError> {
        let last_user = transcript
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Ok(Completion {
            content: format!("You said: {last_user}"),
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Lock a mutex, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
