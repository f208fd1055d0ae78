//! Conversation session management.
//!
//! A `ConversationSession` owns one append-only transcript and mediates
//! every call to the completion gateway.

mod chat;
mod manager;
mod types;


pub use manager::ConversationSession;
pub use types::ChatError;
