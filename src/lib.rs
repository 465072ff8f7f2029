//! Chatterbox: an owner-operated chat bot that answers mentions and replies
//! through pluggable LLM backends.

pub mod agent;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod llm;
pub mod messaging;
pub mod settings;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Channel identifier type.
pub type ChannelId = Arc<str>;

/// User identifier type.
pub type UserId = Arc<str>;

/// Message identifier type.
pub type MessageId = Arc<str>;

/// Inbound message from the messaging platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    /// Display tag of the author (e.g. `alice#0001` or `alice`).
    pub author_tag: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Users explicitly mentioned in the message, in mention order.
    pub mentions: Vec<UserId>,
    /// Message this one replies to, if any. Resolving its author needs a fetch.
    pub referenced_message_id: Option<MessageId>,
    pub guild_id: Option<Arc<str>>,
}

impl InboundMessage {
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|mention| mention.as_ref() == user_id)
    }
}

/// A message the bot has sent, as reported back by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// A message fetched from channel history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub author_id: UserId,
}

/// Outbound content for replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundResponse {
    Text(String),
    /// Text with a file attached.
    File {
        content: String,
        attachment: Attachment,
    },
}

impl From<String> for OutboundResponse {
    fn from(text: String) -> Self {
        OutboundResponse::Text(text)
    }
}

impl From<&str> for OutboundResponse {
    fn from(text: &str) -> Self {
        OutboundResponse::Text(text.to_string())
    }
}

/// File attachment carried inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Public profile of a platform user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub tag: String,
    pub avatar_url: Option<String>,
}

/// Public metadata of a server/guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: Arc<str>,
    pub name: String,
    pub icon_url: Option<String>,
}
