//! Owner check, handler lookup, and outcome application.

use crate::commands::{
    CommandContext, CommandOutcome, CommandRegistry, FunEndpoints, ParsedCommand, imagine,
};
use crate::config::TypingConfig;
use crate::error::{CommandError, Error};
use crate::llm::ImageGenerator;
use crate::messaging::MessagingDyn;
use crate::state::BotState;
use crate::{InboundMessage, UserId};

/// How a command message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Author is not the owner. Nothing was sent or changed.
    Ignored,
    /// No handler with that name.
    Unknown,
    /// Bad arguments; usage text was sent and nothing changed.
    Rejected,
    Completed,
    /// The handler errored; a failure reply was attempted.
    Failed,
}

/// Runs owner commands one message at a time.
///
/// Each call to [`CommandDispatcher::dispatch`] is one Idle -> Executing ->
/// Idle cycle. Every handler error is turned into a reply here, so nothing
/// escapes to the event loop.
pub struct CommandDispatcher {
    registry: CommandRegistry,
    owner_id: UserId,
    prefix: String,
    http_client: reqwest::Client,
    endpoints: FunEndpoints,
    image_generator: ImageGenerator,
    typing: TypingConfig,
}

impl CommandDispatcher {
    pub fn new(owner_id: UserId, prefix: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            registry: CommandRegistry::builtin(),
            owner_id,
            prefix: prefix.into(),
            image_generator: ImageGenerator::new(None, None, 0, http_client.clone()),
            http_client,
            endpoints: FunEndpoints::default(),
            typing: TypingConfig::default(),
        }
    }

    pub fn with_image_generator(mut self, image_generator: ImageGenerator) -> Self {
        self.image_generator = image_generator;
        self
    }

    pub fn with_endpoints(mut self, endpoints: FunEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_typing(mut self, typing: TypingConfig) -> Self {
        self.typing = typing;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub async fn dispatch(
        &self,
        message: &InboundMessage,
        command: ParsedCommand,
        messaging: &dyn MessagingDyn,
        state: &BotState,
    ) -> Dispatch {
        if message.author_id != self.owner_id {
            tracing::debug!(author_id = %message.author_id, command = %command.name, "ignoring command from non-owner");
            return Dispatch::Ignored;
        }

        let ctx = CommandContext {
            message,
            args: &command.args,
            messaging,
            state,
            prefix: &self.prefix,
            http_client: &self.http_client,
            endpoints: &self.endpoints,
        };

        tracing::info!(command = %command.name, channel_id = %message.channel_id, "running command");

        if command.name == "imagine" {
            return match imagine::run(&ctx, &self.image_generator, self.typing).await {
                Ok(()) => Dispatch::Completed,
                Err(Error::Command(CommandError::Usage(text))) => {
                    Self::best_effort(ctx.reply(text).await.map(drop));
                    Dispatch::Rejected
                }
                Err(error) => self.report_failure(&ctx, &command, error).await,
            };
        }

        let Some(handler) = self.registry.get(&command.name) else {
            let text = format!("Unknown command. Try {}help", self.prefix);
            Self::best_effort(ctx.reply(text).await.map(drop));
            return Dispatch::Unknown;
        };

        match handler.execute(&ctx).await {
            Ok(outcome) => {
                Self::apply(state, outcome).await;
                Dispatch::Completed
            }
            Err(Error::Command(CommandError::Usage(text))) => {
                Self::best_effort(ctx.say(&text).await.map(drop));
                Dispatch::Rejected
            }
            Err(error) => self.report_failure(&ctx, &command, error).await,
        }
    }

    async fn apply(state: &BotState, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::NoChange => {}
            CommandOutcome::SetGlobalAi(enabled) => state.set_global_ai(enabled).await,
            CommandOutcome::SetChannelOverride { channel_id, value } => {
                state.set_channel_override(channel_id, value).await;
            }
        }
    }

    async fn report_failure(
        &self,
        ctx: &CommandContext<'_>,
        command: &ParsedCommand,
        error: Error,
    ) -> Dispatch {
        tracing::warn!(command = %command.name, %error, "command failed");
        Self::best_effort(ctx.reply(format!("Command failed: {error}")).await.map(drop));
        Dispatch::Failed
    }

    fn best_effort(result: crate::Result<()>) {
        if let Err(error) = result {
            tracing::warn!(%error, "failed to send command response");
        }
    }
}
