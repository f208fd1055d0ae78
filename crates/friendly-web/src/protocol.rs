//! Chat wire protocol: JSON text frames tagged by `type`.

use serde::{Deserialize, Serialize};

/// Author shown on error frames.
pub const SYSTEM_AUTHOR: &str = "System";

/// Frames a browser client sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "message")]
    Message { content: String },

    /// End the current conversation and start a fresh one.
    #[serde(rename = "reset")]
    Reset,
}

/// Frames the server sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "session_ready")]
    SessionReady { session_id: String },

    #[serde(rename = "message")]
    Message { author: String, content: String },

    /// A reply is being generated.
    #[serde(rename = "thinking")]
    Thinking,

    #[serde(rename = "error")]
    Error { author: String, content: String },
}

impl ServerFrame {
    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            author: SYSTEM_AUTHOR.into(),
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Every variant holds only strings, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
