//! Chatterbox CLI entry point.

use anyhow::Context as _;
use chatterbox::agent::{Responder, Router};
use chatterbox::commands::CommandDispatcher;
use chatterbox::config::Config;
use chatterbox::conversation::ConversationStore;
use chatterbox::db::Db;
use chatterbox::llm::{ImageGenerator, LlmManager, ProviderKind};
use chatterbox::messaging::{DiscordAdapter, MessagingDyn};
use chatterbox::settings::ChannelSettingsStore;
use chatterbox::state::BotState;
use clap::Parser;
use futures::StreamExt as _;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatterbox")]
#[command(about = "Owner-operated chat bot with pluggable LLM backends")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("starting chatterbox");

    let config = Config::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load configuration from environment".to_string(),
    })?;
    tracing::info!(data_dir = %config.data_dir.display(), "configuration loaded");

    let db = Db::connect(&config.sqlite_path())
        .await
        .with_context(|| "failed to open conversation database")?;

    let llm = Arc::new(LlmManager::new(&config.llm).with_context(|| "failed to initialize LLM manager")?);
    tracing::info!(provider = %llm.selected_provider(), "LLM manager initialized");

    let state = Arc::new(
        BotState::load(
            ChannelSettingsStore::new(config.channel_settings_path()),
            llm.clone(),
        )
        .await,
    );

    let image_generator = ImageGenerator::new(
        llm.provider(ProviderKind::Shapes),
        config.llm.shapes_image_model.clone(),
        config.llm.max_output_tokens,
        llm.http_client().clone(),
    )
    .with_images_dir(config.images_dir());

    let dispatcher = CommandDispatcher::new(
        config.discord.owner_id.clone(),
        config.discord.prefix.clone(),
        llm.http_client().clone(),
    )
    .with_image_generator(image_generator)
    .with_typing(config.typing);

    let responder = Responder::new(
        ConversationStore::new(db.sqlite.clone()),
        config.personality.clone(),
        config.typing,
    );

    let messaging: Arc<dyn MessagingDyn> = Arc::new(DiscordAdapter::new(config.discord.token.clone()));
    let mut inbound = messaging
        .start()
        .await
        .with_context(|| format!("failed to start {} adapter", messaging.name()))?;

    let router = Arc::new(Router::new(dispatcher, responder, state, messaging.clone()));
    tracing::info!(prefix = %config.discord.prefix, "chatterbox started");

    loop {
        tokio::select! {
            message = inbound.next() => {
                let Some(message) = message else {
                    tracing::info!("inbound stream ended");
                    break;
                };
                let router = router.clone();
                tokio::spawn(async move {
                    let message_id = message.id.clone();
                    let route = router.handle(message).await;
                    tracing::debug!(%message_id, ?route, "message handled");
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("shutting down");
    if let Err(error) = messaging.shutdown().await {
        tracing::warn!(%error, "adapter shutdown failed");
    }
    db.close().await;

    tracing::info!("chatterbox stopped");
    Ok(())
}
