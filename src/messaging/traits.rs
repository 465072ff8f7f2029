//! Messaging trait and dynamic dispatch companion.

use crate::error::Result;
use crate::{ChannelMessage, GuildInfo, InboundMessage, OutboundResponse, SentMessage, UserId, UserProfile};

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Message stream type.
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundMessage> + Send>>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Static trait for messaging adapters.
/// Use this for type-safe implementations.
pub trait Messaging: Send + Sync + 'static {
    /// Unique name for this adapter.
    fn name(&self) -> &str;

    /// Start the adapter and return inbound message stream.
    fn start(&self) -> impl Future<Output = Result<InboundStream>> + Send;

    /// The bot's own user id. `None` until the connection is ready.
    fn bot_user_id(&self) -> Option<UserId>;

    /// Post `content` to a channel.
    fn send(
        &self,
        channel_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<SentMessage>> + Send;

    /// Reply to `message`, quoting it.
    fn reply(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> impl Future<Output = Result<SentMessage>> + Send;

    /// Replace the content of a message the bot sent.
    fn edit(&self, sent: &SentMessage, content: &str) -> impl Future<Output = Result<()>> + Send;

    /// Show the typing indicator in a channel.
    fn send_typing(&self, _channel_id: &str) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Author of a message, fetched from the platform.
    fn fetch_message_author(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<UserId>> + Send;

    /// Profile of a user, `None` when the id does not resolve.
    fn fetch_user(&self, user_id: &str) -> impl Future<Output = Result<Option<UserProfile>>> + Send;

    fn fetch_guild(&self, guild_id: &str) -> impl Future<Output = Result<GuildInfo>> + Send;

    /// Most recent messages in a channel, newest first.
    fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> impl Future<Output = Result<Vec<ChannelMessage>>> + Send;

    fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Gateway heartbeat latency, if known.
    fn gateway_latency(&self) -> impl Future<Output = Option<Duration>> + Send {
        async { None }
    }

    /// Graceful shutdown.
    fn shutdown(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Dynamic trait for runtime polymorphism.
/// Use this when you need `Arc<dyn MessagingDyn>` for storing different adapters.
pub trait MessagingDyn: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn start<'a>(&'a self) -> BoxFuture<'a, Result<InboundStream>>;

    fn bot_user_id(&self) -> Option<UserId>;

    fn send<'a>(&'a self, channel_id: &'a str, content: &'a str) -> BoxFuture<'a, Result<SentMessage>>;

    fn reply<'a>(
        &'a self,
        message: &'a InboundMessage,
        response: OutboundResponse,
    ) -> BoxFuture<'a, Result<SentMessage>>;

    fn edit<'a>(&'a self, sent: &'a SentMessage, content: &'a str) -> BoxFuture<'a, Result<()>>;

    fn send_typing<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Result<()>>;

    fn fetch_message_author<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<UserId>>;

    fn fetch_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<UserProfile>>>;

    fn fetch_guild<'a>(&'a self, guild_id: &'a str) -> BoxFuture<'a, Result<GuildInfo>>;

    fn recent_messages<'a>(
        &'a self,
        channel_id: &'a str,
        limit: u8,
    ) -> BoxFuture<'a, Result<Vec<ChannelMessage>>>;

    fn delete_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    fn gateway_latency<'a>(&'a self) -> BoxFuture<'a, Option<Duration>>;

    fn shutdown<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

/// Blanket implementation: any type implementing Messaging automatically implements MessagingDyn.
impl<T: Messaging> MessagingDyn for T {
    fn name(&self) -> &str {
        Messaging::name(self)
    }

    fn start<'a>(&'a self) -> BoxFuture<'a, Result<InboundStream>> {
        Box::pin(Messaging::start(self))
    }

    fn bot_user_id(&self) -> Option<UserId> {
        Messaging::bot_user_id(self)
    }

    fn send<'a>(&'a self, channel_id: &'a str, content: &'a str) -> BoxFuture<'a, Result<SentMessage>> {
        Box::pin(Messaging::send(self, channel_id, content))
    }

    fn reply<'a>(
        &'a self,
        message: &'a InboundMessage,
        response: OutboundResponse,
    ) -> BoxFuture<'a, Result<SentMessage>> {
        Box::pin(Messaging::reply(self, message, response))
    }

    fn edit<'a>(&'a self, sent: &'a SentMessage, content: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(Messaging::edit(self, sent, content))
    }

    fn send_typing<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(Messaging::send_typing(self, channel_id))
    }

    fn fetch_message_author<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<UserId>> {
        Box::pin(Messaging::fetch_message_author(self, channel_id, message_id))
    }

    fn fetch_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<UserProfile>>> {
        Box::pin(Messaging::fetch_user(self, user_id))
    }

    fn fetch_guild<'a>(&'a self, guild_id: &'a str) -> BoxFuture<'a, Result<GuildInfo>> {
        Box::pin(Messaging::fetch_guild(self, guild_id))
    }

    fn recent_messages<'a>(
        &'a self,
        channel_id: &'a str,
        limit: u8,
    ) -> BoxFuture<'a, Result<Vec<ChannelMessage>>> {
        Box::pin(Messaging::recent_messages(self, channel_id, limit))
    }

    fn delete_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(Messaging::delete_message(self, channel_id, message_id))
    }

    fn gateway_latency<'a>(&'a self) -> BoxFuture<'a, Option<Duration>> {
        Box::pin(Messaging::gateway_latency(self))
    }

    fn shutdown<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(Messaging::shutdown(self))
    }
}
