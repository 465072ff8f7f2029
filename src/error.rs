//! Top-level error types for Chatterbox.

use crate::llm::ProviderKind;
use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<config::ConfigError>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),
}

/// Database connection and operation errors.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("failed to connect to SQLite: {0}")]
    SqliteConnect(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider {0} is not configured")]
    ProviderNotConfigured(ProviderKind),

    #[error("{provider} request failed: {message}")]
    ProviderRequest {
        provider: ProviderKind,
        message: String,
    },

    #[error("empty response from {0}")]
    EmptyResponse(ProviderKind),

    #[error("Image generation not configured")]
    ImageNotConfigured,

    #[error("image download failed: {0}")]
    ImageDownload(String),
}

/// Messaging platform errors.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("adapter not started")]
    NotStarted,

    #[error("platform request failed: {0}")]
    Request(String),
}

/// Command execution errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Bad arguments. The text is shown to the user verbatim.
    #[error("{0}")]
    Usage(String),
}

/// Channel settings persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read channel settings from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write channel settings to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed channel settings: {0}")]
    Parse(#[from] serde_json::Error),
}
