//! Google Gemini `generateContent` backend.

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, ProviderKind, TextProvider, Usage, truncate_body,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self::with_base_url(GEMINI_BASE_URL, api_key, http_client)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http_client,
        }
    }

    fn request_error(message: impl Into<String>) -> LlmError {
        LlmError::ProviderRequest {
            provider: ProviderKind::Gemini,
            message: message.into(),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GenerateContentRequest {
            contents: request
                .messages
                .into_iter()
                .map(|message| Content {
                    role: if message.role == "assistant" {
                        "model".into()
                    } else {
                        "user".into()
                    },
                    parts: vec![Part {
                        text: message.content,
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
            },
        };

        // Model format: gemini-1.5-flash or models/gemini-1.5-flash
        let model_name = if request.model.starts_with("models/") {
            request.model
        } else {
            format!("models/{}", request.model)
        };
        let url = format!(
            "{}/{model_name}:generateContent",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| Self::request_error(format!("failed to read response body: {e}")))?;

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                Self::request_error(format!(
                    "response ({status}) is not valid JSON: {e}\nBody: {}",
                    truncate_body(&response_text)
                ))
            })?;

        if let Some(error) = parsed.error {
            return Err(Self::request_error(format!(
                "API error ({status}): {}",
                error.message
            )));
        }
        if !status.is_success() {
            return Err(Self::request_error(format!(
                "API error ({status}): {}",
                truncate_body(&response_text)
            )));
        }

        let text: String = parsed
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse(ProviderKind::Gemini));
        }

        let usage = parsed
            .usage_metadata
            .and_then(|usage| usage.total_token_count)
            .map(|total_tokens| Usage { total_tokens });

        Ok(CompletionResponse { text, usage })
    }
}
