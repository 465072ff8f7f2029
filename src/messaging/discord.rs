//! Discord messaging adapter using serenity.

use crate::error::{MessagingError, Result};
use crate::messaging::traits::{InboundStream, Messaging};
use crate::{
    ChannelMessage, GuildInfo, InboundMessage, MessageId, OutboundResponse, SentMessage, UserId,
    UserProfile,
};

use serenity::all::{
    ChannelId as DiscordChannelId, Client, Context, CreateAttachment, CreateMessage, EditMessage,
    EventHandler, GatewayIntents, GetMessages, GuildId, Http, Message, MessageId as DiscordMessageId,
    Ready, ShardManager, UserId as DiscordUserId,
};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Inbound queue depth before the gateway handler waits on the router.
const INBOUND_BUFFER: usize = 256;

/// Discord adapter state.
pub struct DiscordAdapter {
    token: String,
    http: OnceLock<Arc<Http>>,
    shard_manager: OnceLock<Arc<ShardManager>>,
    bot_user_id: Arc<OnceLock<UserId>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: OnceLock::new(),
            shard_manager: OnceLock::new(),
            bot_user_id: Arc::new(OnceLock::new()),
        }
    }

    fn http(&self) -> Result<&Arc<Http>> {
        self.http.get().ok_or_else(|| MessagingError::NotStarted.into())
    }
}

impl Messaging for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<InboundStream> {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        let handler = Handler {
            inbound_tx,
            bot_user_id: self.bot_user_id.clone(),
        };

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = Client::builder(&self.token, intents)
            .event_handler(handler)
            .await
            .map_err(request_error)?;

        self.http.set(client.http.clone()).ok();
        self.shard_manager.set(client.shard_manager.clone()).ok();

        tokio::spawn(async move {
            if let Err(error) = client.start().await {
                tracing::error!(%error, "discord gateway error");
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(inbound_rx);
        Ok(Box::pin(stream))
    }

    fn bot_user_id(&self) -> Option<UserId> {
        self.bot_user_id.get().cloned()
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<SentMessage> {
        let http = self.http()?;
        let channel = parse_channel_id(channel_id)?;
        let message = channel.say(http.as_ref(), content).await.map_err(request_error)?;
        Ok(to_sent_message(&message))
    }

    async fn reply(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> Result<SentMessage> {
        let http = self.http()?;
        let channel = parse_channel_id(&message.channel_id)?;
        let reference = (channel, parse_message_id(&message.id)?);

        let builder = match response {
            OutboundResponse::Text(text) => CreateMessage::new().content(text),
            OutboundResponse::File {
                content,
                attachment,
            } => CreateMessage::new()
                .content(content)
                .add_file(CreateAttachment::bytes(attachment.data, attachment.filename)),
        };

        let sent = channel
            .send_message(http.as_ref(), builder.reference_message(reference))
            .await
            .map_err(request_error)?;
        Ok(to_sent_message(&sent))
    }

    async fn edit(&self, sent: &SentMessage, content: &str) -> Result<()> {
        let http = self.http()?;
        parse_channel_id(&sent.channel_id)?
            .edit_message(
                http.as_ref(),
                parse_message_id(&sent.id)?,
                EditMessage::new().content(content),
            )
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_typing(&self, channel_id: &str) -> Result<()> {
        let http = self.http()?;
        http.broadcast_typing(parse_channel_id(channel_id)?)
            .await
            .map_err(request_error)
    }

    async fn fetch_message_author(&self, channel_id: &str, message_id: &str) -> Result<UserId> {
        let http = self.http()?;
        let message = parse_channel_id(channel_id)?
            .message(http.as_ref(), parse_message_id(message_id)?)
            .await
            .map_err(request_error)?;
        Ok(message.author.id.to_string().into())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let http = self.http()?;
        let Ok(id) = parse_id("user", user_id) else {
            return Ok(None);
        };
        match DiscordUserId::new(id).to_user(http.as_ref()).await {
            Ok(user) => Ok(Some(UserProfile {
                id: user.id.to_string().into(),
                tag: user.tag(),
                avatar_url: user.avatar_url(),
            })),
            Err(error) => {
                tracing::debug!(%error, user_id, "user lookup failed");
                Ok(None)
            }
        }
    }

    async fn fetch_guild(&self, guild_id: &str) -> Result<GuildInfo> {
        let http = self.http()?;
        let guild = GuildId::new(parse_id("guild", guild_id)?)
            .to_partial_guild(http.as_ref())
            .await
            .map_err(request_error)?;
        Ok(GuildInfo {
            id: guild.id.to_string().into(),
            icon_url: guild.icon_url(),
            name: guild.name,
        })
    }

    async fn recent_messages(&self, channel_id: &str, limit: u8) -> Result<Vec<ChannelMessage>> {
        let http = self.http()?;
        let messages = parse_channel_id(channel_id)?
            .messages(http.as_ref(), GetMessages::new().limit(limit.clamp(1, 100)))
            .await
            .map_err(request_error)?;
        Ok(messages
            .iter()
            .map(|message| ChannelMessage {
                id: message.id.to_string().into(),
                author_id: message.author.id.to_string().into(),
            })
            .collect())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let http = self.http()?;
        parse_channel_id(channel_id)?
            .delete_message(http.as_ref(), parse_message_id(message_id)?)
            .await
            .map_err(request_error)
    }

    async fn gateway_latency(&self) -> Option<Duration> {
        let shard_manager = self.shard_manager.get()?;
        let runners = shard_manager.runners.lock().await;
        runners.values().find_map(|runner| runner.latency)
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(shard_manager) = self.shard_manager.get() {
            shard_manager.shutdown_all().await;
        }
        tracing::info!("discord adapter shut down");
        Ok(())
    }
}

struct Handler {
    inbound_tx: mpsc::Sender<InboundMessage>,
    bot_user_id: Arc<OnceLock<UserId>>,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.tag(), "connected to discord");
        self.bot_user_id
            .set(ready.user.id.to_string().into())
            .ok();
    }

    async fn message(&self, _ctx: Context, message: Message) {
        let inbound = to_inbound_message(&message);
        if self.inbound_tx.send(inbound).await.is_err() {
            tracing::debug!("inbound receiver dropped, discarding message");
        }
    }
}

fn to_inbound_message(message: &Message) -> InboundMessage {
    InboundMessage {
        id: message.id.to_string().into(),
        channel_id: message.channel_id.to_string().into(),
        author_id: message.author.id.to_string().into(),
        author_tag: message.author.tag(),
        content: message.content.clone(),
        timestamp: snowflake_time(message.id.get()),
        mentions: message
            .mentions
            .iter()
            .map(|user| UserId::from(user.id.to_string()))
            .collect(),
        referenced_message_id: message
            .message_reference
            .as_ref()
            .and_then(|reference| reference.message_id)
            .map(|id| MessageId::from(id.to_string())),
        guild_id: message.guild_id.map(|id| id.to_string().into()),
    }
}

fn to_sent_message(message: &Message) -> SentMessage {
    SentMessage {
        id: message.id.to_string().into(),
        channel_id: message.channel_id.to_string().into(),
        timestamp: snowflake_time(message.id.get()),
    }
}

/// Creation time encoded in a snowflake id, at millisecond precision.
fn snowflake_time(id: u64) -> chrono::DateTime<chrono::Utc> {
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

fn parse_id(kind: &'static str, value: &str) -> std::result::Result<u64, MessagingError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| MessagingError::InvalidId {
            kind,
            value: value.to_string(),
        })
}

fn parse_channel_id(value: &str) -> Result<DiscordChannelId> {
    Ok(DiscordChannelId::new(parse_id("channel", value)?))
}

fn parse_message_id(value: &str) -> Result<DiscordMessageId> {
    Ok(DiscordMessageId::new(parse_id("message", value)?))
}

fn request_error(error: serenity::Error) -> crate::Error {
    MessagingError::Request(error.to_string()).into()
}
