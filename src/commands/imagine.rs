//! `imagine <prompt>`: image generation, handled outside the registry.

use crate::agent::typing::simulate_typing;
use crate::commands::CommandContext;
use crate::config::TypingConfig;
use crate::error::{CommandError, Result};
use crate::llm::image::{ImageGenerator, ImageOutcome};
use crate::OutboundResponse;

/// Generate an image for the command arguments and reply with it.
///
/// Generation failures are answered with the error text and are not errors
/// of the command itself.
pub async fn run(
    ctx: &CommandContext<'_>,
    generator: &ImageGenerator,
    typing: TypingConfig,
) -> Result<()> {
    let prompt = ctx.args.join(" ");
    if prompt.is_empty() {
        return Err(CommandError::Usage(format!("Usage: {}imagine <description>", ctx.prefix)).into());
    }

    if generator.is_configured() {
        simulate_typing(ctx.messaging, &ctx.message.channel_id, typing).await;
    }

    match generator.generate(&prompt).await {
        Ok(ImageOutcome::Image(attachment)) => {
            tracing::info!(filename = %attachment.filename, bytes = attachment.data.len(), "image generated");
            ctx.reply(OutboundResponse::File {
                content: "Generated image:".into(),
                attachment,
            })
            .await?;
        }
        Ok(ImageOutcome::NoImage(content)) => {
            ctx.reply(format!("\"{content}\". No image found")).await?;
        }
        Err(error) => {
            tracing::warn!(%error, "image generation failed");
            ctx.reply(error.to_string()).await?;
        }
    }
    Ok(())
}
