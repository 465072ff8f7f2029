//! LLM manager: provider selection, dispatch and usage accounting.

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::gemini::GeminiProvider;
use crate::llm::openai::OpenAiCompatibleProvider;
use crate::llm::provider::{ChatMessage, CompletionRequest, ProviderKind, TextProvider};
use crate::llm::usage::UsageCounters;

use anyhow::Context as _;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes text generation to the currently selected provider.
///
/// Selection and the Gemini model are swapped atomically, but a concurrent
/// `api` switch and an in-flight generation are not ordered: the generation
/// uses whichever provider was selected when it started.
pub struct LlmManager {
    providers: HashMap<ProviderKind, Arc<dyn TextProvider>>,
    selected: ArcSwap<ProviderKind>,
    gemini_model: ArcSwap<String>,
    groq_model: String,
    shapes_model: String,
    max_output_tokens: u32,
    usage: UsageCounters,
    http_client: reqwest::Client,
}

impl LlmManager {
    /// Build the manager, registering every provider that has an API key.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .with_context(|| "failed to build HTTP client")?;

        let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();
        if let Some(key) = &config.groq_api_key {
            providers.push(Arc::new(OpenAiCompatibleProvider::groq(
                key.clone(),
                http_client.clone(),
            )));
        }
        if let Some(key) = &config.shapes_api_key {
            providers.push(Arc::new(OpenAiCompatibleProvider::shapes(
                key.clone(),
                http_client.clone(),
            )));
        }
        if let Some(key) = &config.gemini_api_key {
            providers.push(Arc::new(GeminiProvider::new(key.clone(), http_client.clone())));
        }

        for provider in &providers {
            tracing::info!(provider = %provider.kind(), "provider configured");
        }

        Ok(Self::with_providers(config, providers, http_client))
    }

    /// Build the manager from explicit provider instances.
    pub fn with_providers(
        config: &LlmConfig,
        providers: impl IntoIterator<Item = Arc<dyn TextProvider>>,
        http_client: reqwest::Client,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.kind(), provider))
            .collect();

        Self {
            providers,
            selected: ArcSwap::from_pointee(config.default_provider),
            gemini_model: ArcSwap::from_pointee(config.gemini_model.clone()),
            groq_model: config.groq_model.clone(),
            shapes_model: config.shapes_model.clone(),
            max_output_tokens: config.max_output_tokens,
            usage: UsageCounters::new(),
            http_client,
        }
    }

    pub fn selected_provider(&self) -> ProviderKind {
        **self.selected.load()
    }

    pub fn set_selected_provider(&self, kind: ProviderKind) {
        self.selected.store(Arc::new(kind));
        tracing::info!(provider = %kind, "selected provider changed");
    }

    pub fn gemini_model(&self) -> String {
        self.gemini_model.load().as_ref().clone()
    }

    pub fn set_gemini_model(&self, model: impl Into<String>) {
        let model = model.into();
        tracing::info!(%model, "gemini model changed");
        self.gemini_model.store(Arc::new(model));
    }

    pub fn usage(&self) -> &UsageCounters {
        &self.usage
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Look up a registered provider.
    pub fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn TextProvider>> {
        self.providers.get(&kind).cloned()
    }

    fn model_for(&self, kind: ProviderKind) -> String {
        match kind {
            ProviderKind::Groq => self.groq_model.clone(),
            ProviderKind::Shapes => self.shapes_model.clone(),
            ProviderKind::Gemini => self.gemini_model(),
        }
    }

    /// Generate a reply for `prompt` with the selected provider.
    ///
    /// Returns the trimmed text. Usage is recorded only on success. No retries.
    pub async fn generate_text(&self, prompt: &str) -> std::result::Result<String, LlmError> {
        let kind = self.selected_provider();
        let result = self.generate_with(kind, prompt).await;
        if let Err(error) = &result {
            tracing::warn!(provider = %kind, %error, "text generation failed");
        }
        result
    }

    async fn generate_with(
        &self,
        kind: ProviderKind,
        prompt: &str,
    ) -> std::result::Result<String, LlmError> {
        let provider = self
            .providers
            .get(&kind)
            .ok_or(LlmError::ProviderNotConfigured(kind))?;

        let request = CompletionRequest {
            model: self.model_for(kind),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: self.max_output_tokens,
        };

        let response = provider.complete(request).await?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse(kind));
        }

        let tokens = response.usage.map(|usage| usage.total_tokens).unwrap_or(0);
        self.usage.record(kind, tokens);
        tracing::debug!(provider = %kind, tokens, "text generated");

        Ok(text.to_string())
    }
}
