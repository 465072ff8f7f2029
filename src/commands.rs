//! Owner commands: parsing, registry, and handlers.

pub mod dispatcher;
pub mod fun;
pub mod imagine;
pub mod info;
pub mod moderation;
pub mod parser;
pub mod provider;
pub mod toggles;

pub use dispatcher::{CommandDispatcher, Dispatch};
pub use parser::{ParsedCommand, parse_command};

use crate::error::{CommandError, Result};
use crate::messaging::MessagingDyn;
use crate::state::BotState;
use crate::{ChannelId, InboundMessage, OutboundResponse, SentMessage};

use std::collections::HashMap;
use std::sync::Arc;

/// State change requested by a handler. The dispatcher applies it; handlers
/// never write the AI flags themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    NoChange,
    SetGlobalAi(bool),
    SetChannelOverride { channel_id: ChannelId, value: bool },
}

/// Base URLs of the public APIs behind `joke` and `meme`.
#[derive(Debug, Clone)]
pub struct FunEndpoints {
    pub joke_url: String,
    pub meme_url: String,
}

impl Default for FunEndpoints {
    fn default() -> Self {
        Self {
            joke_url: "https://official-joke-api.appspot.com/random_joke".into(),
            meme_url: "https://meme-api.com/gimme".into(),
        }
    }
}

/// What a handler may see and touch while it runs.
pub struct CommandContext<'a> {
    pub message: &'a InboundMessage,
    pub args: &'a [String],
    pub messaging: &'a dyn MessagingDyn,
    pub state: &'a BotState,
    pub prefix: &'a str,
    pub http_client: &'a reqwest::Client,
    pub endpoints: &'a FunEndpoints,
}

impl CommandContext<'_> {
    /// Post to the channel the command came from.
    pub async fn say(&self, content: &str) -> Result<SentMessage> {
        self.messaging.send(&self.message.channel_id, content).await
    }

    /// Post a confirmation for a change that has already taken effect. A
    /// failed send is logged; the change stands.
    pub async fn confirm(&self, content: &str) {
        if let Err(error) = self.say(content).await {
            tracing::warn!(%error, channel_id = %self.message.channel_id, "failed to send confirmation");
        }
    }

    /// Reply to the command message.
    pub async fn reply(&self, response: impl Into<OutboundResponse>) -> Result<SentMessage> {
        self.messaging.reply(self.message, response.into()).await
    }

    /// `Usage: <prefix><rest>` as a validation error.
    pub fn usage(&self, rest: &str) -> crate::Error {
        CommandError::Usage(format!("Usage: {}{rest}", self.prefix)).into()
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// A named owner command.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome>;
}

/// Lookup table from command name to handler.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(toggles::AiCommand);
        registry.register(toggles::ChannelCommand);
        registry.register(toggles::RespondToAllCommand);
        registry.register(provider::ApiCommand);
        registry.register(provider::GeminiCommand);
        registry.register(fun::JokeCommand);
        registry.register(fun::MemeCommand);
        registry.register(info::PingCommand);
        registry.register(info::StatsCommand);
        registry.register(info::AvatarCommand);
        registry.register(info::ServerIconCommand);
        registry.register(info::HelpCommand);
        registry.register(moderation::SpamCommand);
        registry.register(moderation::ClearCommand);
        registry
    }

    pub fn register(&mut self, command: impl Command + 'static) {
        self.commands.insert(command.name(), Arc::new(command));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
