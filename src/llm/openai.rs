//! OpenAI-compatible chat completions backend (Groq, Shapes).

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, ProviderKind, TextProvider, Usage, truncate_body,
};

use async_trait::async_trait;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const SHAPES_BASE_URL: &str = "https://api.shapes.inc/v1";

/// Provider speaking the `/chat/completions` protocol.
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            api_key: api_key.into(),
            http_client,
        }
    }

    pub fn groq(api_key: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self::new(ProviderKind::Groq, GROQ_BASE_URL, api_key, http_client)
    }

    pub fn shapes(api_key: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self::new(ProviderKind::Shapes, SHAPES_BASE_URL, api_key, http_client)
    }

    fn request_error(&self, message: impl Into<String>) -> LlmError {
        LlmError::ProviderRequest {
            provider: self.kind,
            message: message.into(),
        }
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.request_error(format!("failed to read response body: {e}")))?;

        let response_body: serde_json::Value =
            serde_json::from_str(&response_text).map_err(|e| {
                self.request_error(format!(
                    "response ({status}) is not valid JSON: {e}\nBody: {}",
                    truncate_body(&response_text)
                ))
            })?;

        if !status.is_success() {
            let message = response_body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error");
            return Err(self.request_error(format!("API error ({status}): {message}")));
        }

        parse_chat_completion(response_body, self.kind)
    }
}

/// Extract the first choice's text and the reported usage.
pub(crate) fn parse_chat_completion(
    body: serde_json::Value,
    kind: ProviderKind,
) -> Result<CompletionResponse, LlmError> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            tracing::warn!(provider = %kind, choice = ?body["choices"][0], "empty response from provider");
            LlmError::EmptyResponse(kind)
        })?;

    let usage = body["usage"]["total_tokens"]
        .as_u64()
        .map(|total_tokens| Usage { total_tokens });

    Ok(CompletionResponse {
        text: text.to_string(),
        usage,
    })
}
