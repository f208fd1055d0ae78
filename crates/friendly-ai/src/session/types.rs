//! Session error type.

use friendly_common::{AgentError, SessionId};

use crate::GatewayError;

/// Failure of a single `send`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The gateway call failed. The session stays usable.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// `send` was called on a session that has already been closed.
    #[error("session {0} is closed")]
    Closed(SessionId),
}

impl From<ChatError> for AgentError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Gateway(e) => e.into(),
            closed @ ChatError::Closed(_) => AgentError::Usage(closed.to_string()),
        }
    }
}
