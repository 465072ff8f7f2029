//! Joke and meme lookups against public APIs.

use crate::commands::{Command, CommandContext, CommandOutcome};
use crate::error::Result;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Joke {
    setup: String,
    punchline: String,
}

#[derive(Debug, Deserialize)]
struct Meme {
    url: String,
    #[serde(default)]
    title: Option<String>,
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
) -> std::result::Result<T, reqwest::Error> {
    http_client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await
}

pub struct JokeCommand;

#[async_trait::async_trait]
impl Command for JokeCommand {
    fn name(&self) -> &'static str {
        "joke"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        match fetch_json::<Joke>(ctx.http_client, &ctx.endpoints.joke_url).await {
            Ok(joke) => {
                ctx.say(&format!("{}\n{}", joke.setup, joke.punchline))
                    .await?;
            }
            Err(error) => {
                tracing::warn!(%error, "joke API request failed");
                ctx.say("Error fetching joke. Try again later.").await?;
            }
        }
        Ok(CommandOutcome::NoChange)
    }
}

pub struct MemeCommand;

#[async_trait::async_trait]
impl Command for MemeCommand {
    fn name(&self) -> &'static str {
        "meme"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome> {
        match fetch_json::<Meme>(ctx.http_client, &ctx.endpoints.meme_url).await {
            Ok(meme) => {
                let title = meme
                    .title
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| "Here's a meme!".into());
                ctx.say(&format!("{title}\n{}", meme.url)).await?;
            }
            Err(error) => {
                tracing::warn!(%error, "meme API request failed");
                ctx.say("Error fetching meme. Try again later.").await?;
            }
        }
        Ok(CommandOutcome::NoChange)
    }
}
