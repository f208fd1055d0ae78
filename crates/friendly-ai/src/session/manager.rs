//! ConversationSession struct and transcript access.

use std::sync::Arc;

use friendly_common::SessionId;

use crate::token_tracker::TokenTracker;
use crate::{CompletionGateway, Message, Role};

/// One user's conversation: a transcript whose first entry is the system
/// prompt, followed by user/assistant entries in conversation order.
pub struct ConversationSession {
    pub(super) id: SessionId,
    pub(super) system_prompt: String,
    /// Append-only; entry 0 is the system entry until the session closes.
    pub(super) transcript: Vec<Message>,
    pub(super) gateway: Arc<dyn CompletionGateway>,
    /// Non-system entries sent per request; 0 sends everything.
    pub(super) context_window: usize,
    pub(super) tracker: TokenTracker,
    pub(super) closed: bool,
}

impl ConversationSession {
    /// Start a conversation. No I/O is performed.
    pub fn create(
        id: SessionId,
        gateway: Arc<dyn CompletionGateway>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id,
            transcript: vec![Message::system(system_prompt.clone())],
            system_prompt,
            gateway,
            context_window: 0,
            tracker: TokenTracker::new(),
            closed: false,
        }
    }

    pub fn with_context_window(mut self, entries: usize) -> Self {
        self.context_window = entries;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The full transcript, system entry first.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// End the session and release its transcript. Later `send` calls fail
    /// with `ChatError::Closed`.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.transcript = Vec::new();
            tracing::debug!(session = %self.id, "session closed");
        }
    }

    /// Entries to send for the next request: the system entry plus the
    /// newest `context_window` entries (all of them when the window is 0).
    pub(crate) fn request_messages(&self) -> Vec<Message> {
        let (system, rest) = match self.transcript.split_first() {
            Some((first, rest)) if first.role == Role::System => (Some(first), rest),
            _ => (None, self.transcript.as_slice()),
        };

        let skip = if self.context_window == 0 {
            0
        } else {
            rest.len().saturating_sub(self.context_window)
        };

        system
            .into_iter()
            .chain(rest[skip..].iter())
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("gateway", &self.gateway.name())
            .field("entries", &self.transcript.len())
            .field("context_window", &self.context_window)
            .field("closed", &self.closed)
            .finish()
    }
}
