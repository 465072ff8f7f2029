//! Provider-neutral completion types and the `TextProvider` trait.

use crate::error::LlmError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The text-generation backends the bot can route to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Groq,
    Gemini,
    Shapes,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Groq, ProviderKind::Shapes, ProviderKind::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Shapes => "shapes",
        }
    }

    /// Human-readable label used in stats output.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Groq => "Groq",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Shapes => "Shapes",
        }
    }

    /// Case-insensitive parse of a provider name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Some(ProviderKind::Groq),
            "gemini" => Some(ProviderKind::Gemini),
            "shapes" => Some(ProviderKind::Shapes),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One chat turn sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Token usage as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub total_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    /// `None` when the provider did not report usage.
    pub usage: Option<Usage>,
}

/// A single text-generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Truncate a response body for error messages to avoid dumping megabytes of HTML.
pub(crate) fn truncate_body(body: &str) -> &str {
    let limit = 500;
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!(ProviderKind::parse("GROQ"), Some(ProviderKind::Groq));
        assert_eq!(ProviderKind::parse("Gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::parse(" shapes "), Some(ProviderKind::Shapes));
        assert_eq!(ProviderKind::parse("openai"), None);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(400);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= 500);
        assert!(body.starts_with(truncated));
    }
}
