//! Session lifecycle for one browser connection, independent of the socket.
//!
//! `start` runs on connect, `reply` for each inbound message, `reset` when
//! the client asks for a fresh conversation and `end` on disconnect.

use std::sync::Arc;

use friendly_ai::{ChatError, SessionRegistry};
use friendly_common::{new_correlation_id, SessionId};
use friendly_config::PersonaConfig;

use crate::protocol::ServerFrame;

pub const EMPTY_MESSAGE: &str = "Message cannot be empty";

pub struct ChatHandler {
    registry: SessionRegistry,
    persona: Arc<PersonaConfig>,
    session_id: SessionId,
    /// Set when the session could not be created. No turns are accepted
    /// afterwards.
    init_error: Option<String>,
}

impl ChatHandler {
    pub fn new(registry: SessionRegistry, persona: Arc<PersonaConfig>) -> Self {
        Self {
            registry,
            persona,
            session_id: SessionId::new(),
            init_error: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Create the session and greet the client.
    pub async fn start(&mut self) -> Vec<ServerFrame> {
        let ready = ServerFrame::SessionReady {
            session_id: self.session_id.to_string(),
        };
        match self
            .registry
            .get_or_create(&self.session_id, &self.persona.system_prompt)
            .await
        {
            Ok(_) => vec![ready, self.message(self.persona.greeting.clone())],
            Err(e) => {
                let message = format!("Failed to initialize the agent: {e}");
                self.init_error = Some(message.clone());
                vec![ready, ServerFrame::error(message)]
            }
        }
    }

    /// Run one conversational turn.
    ///
    /// A session that was reaped while idle is recreated empty.
    pub async fn reply(&self, content: &str) -> ServerFrame {
        if let Some(error) = &self.init_error {
            return ServerFrame::error(error.clone());
        }
        let content = content.trim();
        if content.is_empty() {
            return ServerFrame::error(EMPTY_MESSAGE);
        }

        let session = match self
            .registry
            .get_or_create(&self.session_id, &self.persona.system_prompt)
            .await
        {
            Ok(session) => session,
            Err(e) => return ServerFrame::error(format!("Failed to initialize the agent: {e}")),
        };

        let turn = new_correlation_id();
        tracing::debug!(session = %self.session_id, turn = %turn, "turn started");

        let mut session = session.lock().await;
        match session.send(content).await {
            Ok(text) => {
                tracing::debug!(session = %self.session_id, turn = %turn, "turn finished");
                self.message(text)
            }
            Err(ChatError::Gateway(e)) => {
                ServerFrame::error(format!("Sorry, I encountered an error: {e}"))
            }
            Err(e @ ChatError::Closed(_)) => {
                tracing::warn!(session = %self.session_id, "turn on a closed session");
                ServerFrame::error(format!("Sorry, I encountered an error: {e}"))
            }
        }
    }

    /// Drop the current conversation and start a new one under a new id.
    ///
    /// After a failed start there is nothing to reset; the stored error is
    /// repeated.
    pub async fn reset(&mut self) -> Vec<ServerFrame> {
        if let Some(error) = &self.init_error {
            return vec![ServerFrame::error(error.clone())];
        }
        self.registry.remove(&self.session_id).await;
        self.session_id = SessionId::new();
        tracing::info!(session = %self.session_id, "conversation reset");
        self.start().await
    }

    /// Release the session.
    pub async fn end(&self) {
        self.registry.remove(&self.session_id).await;
    }

    fn message(&self, content: String) -> ServerFrame {
        ServerFrame::Message {
            author: self.persona.name.clone(),
            content,
        }
    }
}
