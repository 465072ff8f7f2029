//! Provider and model selection.

use crate::commands::{Command, CommandContext, CommandOutcome};
use crate::error::Result;
use crate::llm::ProviderKind;

/// `api groq|gemini|shapes`
pub struct ApiCommand;

#[async_trait::async_trait]
impl Command for ApiCommand {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let kind = ctx
            .arg(0)
            .and_then(ProviderKind::parse)
            .ok_or_else(|| ctx.usage("api groq/gemini/shapes"))?;

        ctx.state.llm().set_selected_provider(kind);
        ctx.confirm(&format!("API switched to: {kind}")).await;
        Ok(CommandOutcome::NoChange)
    }
}

/// `gemini <model>`
pub struct GeminiCommand;

#[async_trait::async_trait]
impl Command for GeminiCommand {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        let model = ctx.arg(0).ok_or_else(|| ctx.usage("gemini <model_name>"))?;

        ctx.state.llm().set_gemini_model(model);
        ctx.confirm(&format!("Gemini model set to: {model}")).await;
        Ok(CommandOutcome::NoChange)
    }
}
