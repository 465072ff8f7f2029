//! Informational commands: ping, stats, avatar, servericon, help.

use crate::commands::{Command, CommandContext, CommandOutcome};
use crate::error::Result;
use crate::llm::ProviderKind;
use crate::UserProfile;

/// `ping`: round-trip and gateway latency.
pub struct PingCommand;

#[async_trait::async_trait]
impl Command for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let sent = ctx.say("Pinging...").await?;
        let latency = (sent.timestamp - ctx.message.timestamp).num_milliseconds();
        // -1 until the first heartbeat is acknowledged.
        let websocket = ctx
            .messaging
            .gateway_latency()
            .await
            .map(|latency| latency.as_millis() as i64)
            .unwrap_or(-1);

        ctx.messaging
            .edit(
                &sent,
                &format!("Pong! Latency: {latency}ms, WebSocket: {websocket}ms"),
            )
            .await?;
        Ok(CommandOutcome::NoChange)
    }
}

/// `stats`: uptime and per-provider usage.
pub struct StatsCommand;

#[async_trait::async_trait]
impl Command for StatsCommand {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let uptime = (chrono::Utc::now() - ctx.state.started_at())
            .num_seconds()
            .max(0);

        let mut lines = vec![
            "**Bot Stats**".to_string(),
            format!("Uptime: {}", format_uptime(uptime)),
            "API Usage:".to_string(),
        ];
        let usage = ctx.state.llm().usage();
        for kind in ProviderKind::ALL {
            let snapshot = usage.snapshot(kind);
            lines.push(format!(
                "- {}: {} calls, {} tokens",
                kind.label(),
                snapshot.calls,
                snapshot.tokens
            ));
        }

        ctx.say(&lines.join("\n")).await?;
        Ok(CommandOutcome::NoChange)
    }
}

fn format_uptime(seconds: i64) -> String {
    format!(
        "{}h {}m {}s",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// `avatar [@user|id]`
pub struct AvatarCommand;

impl AvatarCommand {
    /// First mention, else a user id in the first argument, else the author.
    async fn resolve_target(ctx: &CommandContext<'_>) -> Result<UserProfile> {
        if let Some(mentioned) = ctx.message.mentions.first()
            && let Some(profile) = ctx.messaging.fetch_user(mentioned).await?
        {
            return Ok(profile);
        }

        if let Some(user_id) = ctx.arg(0)
            && let Some(profile) = ctx.messaging.fetch_user(user_id).await?
        {
            return Ok(profile);
        }

        let author = ctx.messaging.fetch_user(&ctx.message.author_id).await?;
        Ok(author.unwrap_or_else(|| UserProfile {
            id: ctx.message.author_id.clone(),
            tag: ctx.message.author_tag.clone(),
            avatar_url: None,
        }))
    }
}

#[async_trait::async_trait]
impl Command for AvatarCommand {
    fn name(&self) -> &'static str {
        "avatar"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let user = Self::resolve_target(ctx).await?;
        let text = match &user.avatar_url {
            Some(url) => format!("{}'s avatar:\n{url}", user.tag),
            None => format!("{} has no avatar.", user.tag),
        };
        ctx.say(&text).await?;
        Ok(CommandOutcome::NoChange)
    }
}

/// `servericon`
pub struct ServerIconCommand;

#[async_trait::async_trait]
impl Command for ServerIconCommand {
    fn name(&self) -> &'static str {
        "servericon"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let Some(guild_id) = &ctx.message.guild_id else {
            ctx.say("This command can only be used in a server.").await?;
            return Ok(CommandOutcome::NoChange);
        };

        let guild = ctx.messaging.fetch_guild(guild_id).await?;
        let text = match &guild.icon_url {
            Some(url) => format!("{}'s icon:\n{url}", guild.name),
            None => "This server has no icon.".to_string(),
        };
        ctx.say(&text).await?;
        Ok(CommandOutcome::NoChange)
    }
}

/// `help`
pub struct HelpCommand;

#[async_trait::async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        ctx.say(&help_text(ctx.prefix)).await?;
        Ok(CommandOutcome::NoChange)
    }
}

pub fn help_text(prefix: &str) -> String {
    let p = prefix;
    [
        "```js".to_string(),
        "**Available Commands:**".to_string(),
        "**AI Control:**".to_string(),
        format!("{p}ai on/off - Toggle AI responses globally"),
        format!("{p}channel on/off - Toggle AI in current channel"),
        format!("{p}respondtoall on/off - Respond to all messages in channel"),
        String::new(),
        "**API Settings:**".to_string(),
        format!("{p}api groq/gemini/shapes - Switch AI provider"),
        format!("{p}gemini <model> - Change Gemini model"),
        String::new(),
        "**Fun Commands:**".to_string(),
        format!("{p}joke - Get a random joke"),
        format!("{p}meme - Get a random meme"),
        String::new(),
        "**Utility:**".to_string(),
        format!("{p}ping - Check bot latency"),
        format!("{p}stats - Show bot statistics"),
        format!("{p}avatar [@user] - Get user avatar"),
        format!("{p}servericon - Get server icon"),
        String::new(),
        "**Moderation:**".to_string(),
        format!("{p}spam <1-10> <msg> - Spam messages"),
        format!("{p}clear <1-100> - Delete my messages"),
        String::new(),
        format!("Type {p}help <command> for more info on a specific command."),
        "```".to_string(),
    ]
    .join("\n")
}
