//! Conversation history: short-term memory per (channel, user).

pub mod history;

pub use history::{ConversationStore, RECENT_LIMIT};
