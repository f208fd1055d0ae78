use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful assistant. \
Your goal is to have a pleasant conversation with the user and assist them with any \
questions or tasks they have. Be supportive, empathetic, and positive in your \
interactions. Provide clear and concise information, and if you're not sure about \
something, just be honest about it.";

/// Persona and conversation settings shared by the CLI and the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Display name used as the author of assistant messages.
    pub name: String,
    pub system_prompt: String,
    pub greeting: String,
    pub farewell: String,
    /// Number of most recent non-system entries sent per request.
    /// 0 sends the whole transcript.
    pub context_window: u32,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Friendly Agent".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            greeting: "Hello! I'm your friendly assistant. How can I help you today?".into(),
            farewell: "Goodbye! Have a great day!".into(),
            context_window: 0,
        }
    }
}
