//! Bulk send and bulk delete of the bot's own messages.
//!
//! Both loops use fixed pacing to stay under platform rate limits. They are
//! not retries, and nothing cancels a loop once started.

use crate::commands::{Command, CommandContext, CommandOutcome};
use crate::error::{CommandError, MessagingError, Result};

use std::time::Duration;

const SPAM_PACING: Duration = Duration::from_millis(1000);
const CLEAR_PACING: Duration = Duration::from_millis(500);
/// How far back `clear` looks for its own messages.
const CLEAR_SCAN_LIMIT: u8 = 100;

fn parse_amount(value: Option<&str>, max: u32) -> Option<u32> {
    value
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|amount| (1..=max).contains(amount))
}

/// `spam <1-10> <text>`
pub struct SpamCommand;

#[async_trait::async_trait]
impl Command for SpamCommand {
    fn name(&self) -> &'static str {
        "spam"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let amount = parse_amount(ctx.arg(0), 10)
            .ok_or_else(|| ctx.usage("spam <amount (1-10)> <message>"))?;
        let text = ctx.args.get(1..).unwrap_or_default().join(" ");
        if text.is_empty() {
            return Err(CommandError::Usage("Please provide a message to spam.".into()).into());
        }

        for _ in 0..amount {
            if let Err(error) = ctx.say(&text).await {
                tracing::warn!(%error, "spam interrupted");
                ctx.say("Error spamming messages. Rate limit or permission issue.")
                    .await?;
                break;
            }
            tokio::time::sleep(SPAM_PACING).await;
        }
        Ok(CommandOutcome::NoChange)
    }
}

/// `clear <1-100>`
pub struct ClearCommand;

impl ClearCommand {
    /// Delete up to `amount` of the bot's messages among the most recent ones.
    async fn delete_own(ctx: &CommandContext<'_>, amount: u32) -> Result<usize> {
        let bot_id = ctx
            .messaging
            .bot_user_id()
            .ok_or(MessagingError::NotStarted)?;
        let channel_id = &ctx.message.channel_id;

        let own: Vec<_> = ctx
            .messaging
            .recent_messages(channel_id, CLEAR_SCAN_LIMIT)
            .await?
            .into_iter()
            .filter(|message| message.author_id == bot_id)
            .take(amount as usize)
            .collect();

        for message in &own {
            ctx.messaging.delete_message(channel_id, &message.id).await?;
            tokio::time::sleep(CLEAR_PACING).await;
        }
        Ok(own.len())
    }
}

#[async_trait::async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let amount =
            parse_amount(ctx.arg(0), 100).ok_or_else(|| ctx.usage("clear <amount (1-100)>"))?;

        match Self::delete_own(ctx, amount).await {
            Ok(0) => {
                ctx.say("No messages from me to clear.").await?;
            }
            Ok(cleared) => {
                tracing::info!(cleared, channel_id = %ctx.message.channel_id, "cleared own messages");
                ctx.say(&format!("Cleared {cleared} of my messages.")).await?;
            }
            Err(error) => {
                tracing::warn!(%error, "clear failed");
                ctx.say("Error clearing my messages. Possible rate limit or permission issue.")
                    .await?;
            }
        }
        Ok(CommandOutcome::NoChange)
    }
}
