//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use crate::llm::ProviderKind;
use crate::UserId;

use anyhow::Context as _;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable prefix, e.g. `CHATTERBOX_DISCORD_TOKEN`.
const ENV_PREFIX: &str = "CHATTERBOX";

const DEFAULT_PERSONALITY: &str = "You are a laid-back regular in this chat. \
Keep replies short, casual and in the same language as the user.";

/// Chatterbox configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path.
    pub data_dir: PathBuf,

    /// Messaging platform settings.
    pub discord: DiscordConfig,

    /// LLM provider configuration.
    pub llm: LlmConfig,

    /// Personality text prepended to every prompt.
    pub personality: String,

    /// Simulated typing delay.
    pub typing: TypingConfig,
}

/// Discord connection and command settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,

    /// The only user allowed to run commands.
    pub owner_id: UserId,

    /// Command prefix, e.g. `!`.
    pub prefix: String,
}

/// LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider selected at startup.
    pub default_provider: ProviderKind,

    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub shapes_api_key: Option<String>,

    pub groq_model: String,
    pub shapes_model: String,

    /// Initial Gemini model. Can be changed at runtime.
    pub gemini_model: String,

    /// Shapes model used by `imagine`. Image generation is off when unset.
    pub shapes_image_model: Option<String>,

    /// Upper bound on generated tokens per request.
    pub max_output_tokens: u32,
}

/// Bounds for the randomized "typing" pause, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct TypingConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_ms: 6_000,
            max_ms: 10_000,
        }
    }
}

/// On-disk / environment shape before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    discord_token: Option<String>,
    owner_id: Option<String>,
    #[serde(default = "default_prefix")]
    prefix: String,
    default_provider: Option<String>,
    groq_api_key: Option<String>,
    gemini_api_key: Option<String>,
    shapes_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    groq_model: String,
    #[serde(default = "default_shapes_model")]
    shapes_model: String,
    #[serde(default = "default_gemini_model")]
    gemini_model: String,
    shapes_image_model: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    max_output_tokens: u32,
    personality: Option<String>,
    personality_file: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    typing_min_ms: Option<u64>,
    typing_max_ms: Option<u64>,
}

fn default_prefix() -> String {
    "!".into()
}

fn default_groq_model() -> String {
    "llama3-8b-8192".into()
}

fn default_shapes_model() -> String {
    "shapesinc/dalle3-r1ja".into()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_max_output_tokens() -> u32 {
    1000
}

impl Config {
    /// Load configuration from an optional TOML file, overlaid with
    /// `CHATTERBOX_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`Config::load`], but reads environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let source_label = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "environment".into());

        let raw: RawConfig = builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|source| ConfigError::Load {
                path: source_label,
                source: Arc::new(source),
            })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let token = raw
            .discord_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingKey("discord_token".into()))?;
        let owner_id = raw
            .owner_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingKey("owner_id".into()))?;

        if raw.prefix.is_empty() || raw.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "command prefix must be non-empty and contain no whitespace, got {:?}",
                raw.prefix
            ))
            .into());
        }

        let default_provider = match raw.default_provider.as_deref() {
            None => ProviderKind::Groq,
            Some(name) => ProviderKind::parse(name).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown default_provider {name:?}, expected groq, gemini or shapes"
                ))
            })?,
        };

        let llm = LlmConfig {
            default_provider,
            groq_api_key: non_empty(raw.groq_api_key),
            gemini_api_key: non_empty(raw.gemini_api_key),
            shapes_api_key: non_empty(raw.shapes_api_key),
            groq_model: raw.groq_model,
            shapes_model: raw.shapes_model,
            gemini_model: raw.gemini_model,
            shapes_image_model: non_empty(raw.shapes_image_model),
            max_output_tokens: raw.max_output_tokens,
        };

        if llm.groq_api_key.is_none() && llm.gemini_api_key.is_none() && llm.shapes_api_key.is_none()
        {
            return Err(ConfigError::Invalid(
                "No LLM provider API key found. Set groq_api_key, gemini_api_key or shapes_api_key."
                    .into(),
            )
            .into());
        }

        let defaults = TypingConfig::default();
        let typing = TypingConfig {
            min_ms: raw.typing_min_ms.unwrap_or(defaults.min_ms),
            max_ms: raw.typing_max_ms.unwrap_or(defaults.max_ms),
        };
        if typing.min_ms > typing.max_ms {
            return Err(ConfigError::Invalid(format!(
                "typing_min_ms ({}) exceeds typing_max_ms ({})",
                typing.min_ms, typing.max_ms
            ))
            .into());
        }

        let personality = match (raw.personality, raw.personality_file) {
            (Some(text), _) => text,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read personality file: {}", path.display()))?
                .trim_end()
                .to_string(),
            (None, None) => DEFAULT_PERSONALITY.to_string(),
        };

        let data_dir = raw.data_dir.unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("chatterbox"))
                .unwrap_or_else(|| PathBuf::from("./data"))
        });

        Ok(Self {
            data_dir,
            discord: DiscordConfig {
                token,
                owner_id: owner_id.trim().into(),
                prefix: raw.prefix,
            },
            llm,
            personality,
            typing,
        })
    }

    /// Get the SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("chatterbox.db")
    }

    /// Get the persisted channel settings path.
    pub fn channel_settings_path(&self) -> PathBuf {
        self.data_dir.join("channel.json")
    }

    /// Directory generated images are saved to.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
