//! Async send for ConversationSession.

use tracing::{debug, warn};

use crate::Message;

use super::manager::ConversationSession;
use super::types::ChatError;

impl ConversationSession {
    /// Add a user message and get the assistant's response.
    ///
    /// The user entry is kept even when the gateway fails, so the next turn
    /// resends it as context; the assistant entry is appended only on
    /// success. If the returned future is dropped mid-call the transcript
    /// is left as after a failed turn.
    pub async fn send(&mut self, user_text: impl Into<String>) -> Result<String, ChatError> {
        if self.closed {
            return Err(ChatError::Closed(self.id.clone()));
        }

        self.transcript.push(Message::user(user_text));
        let request = self.request_messages();

        debug!(
            session = %self.id,
            gateway = %self.gateway.name(),
            sent = request.len(),
            stored = self.transcript.len(),
            "sending transcript"
        );

        let completion = match self.gateway.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(session = %self.id, error = %e, "completion failed");
                return Err(e.into());
            }
        };

        self.tracker.record(&completion.usage);
        self.transcript
            .push(Message::assistant(completion.content.clone()));

        debug!(
            session = %self.id,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "completion received"
        );

        Ok(completion.content)
    }
}
