//! Conversational replies: trigger evaluation and the response pipeline.

use crate::agent::typing::simulate_typing;
use crate::config::TypingConfig;
use crate::conversation::ConversationStore;
use crate::messaging::MessagingDyn;
use crate::state::BotState;
use crate::InboundMessage;

/// Sent when generation fails.
pub const FALLBACK_REPLY: &str = "Bro i am busy say again.";

/// How a non-command message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// AI is off for this channel.
    Disabled,
    /// Not a mention, not a reply to the bot, and respond-to-all is off.
    NotTriggered,
    Replied,
    /// Generation failed and the fallback was sent.
    Fallback,
    /// Generation succeeded but the reply could not be delivered.
    Undelivered,
}

/// Builds prompts from personality and recent history and answers through
/// the selected provider.
pub struct Responder {
    conversations: ConversationStore,
    personality: String,
    typing: TypingConfig,
}

impl Responder {
    pub fn new(conversations: ConversationStore, personality: impl Into<String>, typing: TypingConfig) -> Self {
        Self {
            conversations,
            personality: personality.into(),
            typing,
        }
    }

    pub async fn respond(
        &self,
        message: &InboundMessage,
        messaging: &dyn MessagingDyn,
        state: &BotState,
    ) -> ResponseOutcome {
        let channel_id = &message.channel_id;

        if !state.is_ai_enabled_for(channel_id).await {
            return ResponseOutcome::Disabled;
        }
        if !self.is_triggered(message, messaging, state).await {
            return ResponseOutcome::NotTriggered;
        }

        let recent = self
            .conversations
            .recent(channel_id, &message.author_id)
            .await;

        simulate_typing(messaging, channel_id, self.typing).await;
        let prompt = build_prompt(&self.personality, &recent, &message.content);
        simulate_typing(messaging, channel_id, self.typing).await;

        let reply = match state.llm().generate_text(&prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(%error, %channel_id, "reply generation failed, sending fallback");
                if let Err(error) = messaging.reply(message, FALLBACK_REPLY.into()).await {
                    tracing::warn!(%error, %channel_id, "failed to send fallback reply");
                }
                return ResponseOutcome::Fallback;
            }
        };

        if let Err(error) = messaging.reply(message, reply.clone().into()).await {
            tracing::warn!(%error, %channel_id, "failed to deliver reply");
            return ResponseOutcome::Undelivered;
        }

        self.conversations
            .append(channel_id, &message.author_id, &format!("User: {}", message.content))
            .await;
        self.conversations
            .append(channel_id, &message.author_id, &format!("Bot: {reply}"))
            .await;

        tracing::debug!(%channel_id, author_id = %message.author_id, "replied");
        ResponseOutcome::Replied
    }

    /// Respond-to-all, a mention of the bot, or a reply to one of its messages.
    /// The referenced message is only fetched when nothing cheaper matched.
    async fn is_triggered(
        &self,
        message: &InboundMessage,
        messaging: &dyn MessagingDyn,
        state: &BotState,
    ) -> bool {
        if state.should_respond_to_all(&message.channel_id).await {
            return true;
        }

        let Some(bot_id) = messaging.bot_user_id() else {
            return false;
        };
        if message.mentions_user(&bot_id) {
            return true;
        }

        let Some(referenced_id) = &message.referenced_message_id else {
            return false;
        };
        match messaging
            .fetch_message_author(&message.channel_id, referenced_id)
            .await
        {
            Ok(author_id) => author_id == bot_id,
            Err(error) => {
                tracing::debug!(%error, message_id = %referenced_id, "could not resolve referenced message");
                false
            }
        }
    }
}

/// `personality`, the recent lines, then the new user line and an open bot turn.
pub fn build_prompt(personality: &str, recent: &[String], content: &str) -> String {
    format!("{personality}\n{}\nUser: {content}\nBot:", recent.join("\n"))
}
