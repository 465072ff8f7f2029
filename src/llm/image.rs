//! Image generation through a Shapes image model.

use crate::Attachment;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, TextProvider};

use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+").expect("hard-coded regex should be valid")
});

/// Result of an image request.
#[derive(Debug)]
pub enum ImageOutcome {
    Image(Attachment),
    /// The model answered without an image URL. Carries its text.
    NoImage(String),
}

/// Asks a chat-style image model for an image and downloads the result.
pub struct ImageGenerator {
    provider: Option<Arc<dyn TextProvider>>,
    model: Option<String>,
    max_tokens: u32,
    http_client: reqwest::Client,
    images_dir: Option<PathBuf>,
}

impl ImageGenerator {
    pub fn new(
        provider: Option<Arc<dyn TextProvider>>,
        model: Option<String>,
        max_tokens: u32,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            model,
            max_tokens,
            http_client,
            images_dir: None,
        }
    }

    /// Also save generated images under `dir`. Saving is best-effort.
    pub fn with_images_dir(mut self, dir: PathBuf) -> Self {
        self.images_dir = Some(dir);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some() && self.model.is_some()
    }

    pub async fn generate(&self, prompt: &str) -> Result<ImageOutcome, LlmError> {
        let (Some(provider), Some(model)) = (&self.provider, &self.model) else {
            return Err(LlmError::ImageNotConfigured);
        };

        let response = provider
            .complete(CompletionRequest {
                model: model.clone(),
                messages: vec![ChatMessage::user(format!("!imagine {prompt}"))],
                max_tokens: self.max_tokens,
            })
            .await?;

        let content = response.text;
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse(provider.kind()));
        }

        let Some(url) = extract_image_url(&content) else {
            return Ok(ImageOutcome::NoImage(content));
        };

        tracing::debug!(%url, "downloading generated image");
        let data = self
            .http_client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LlmError::ImageDownload(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| LlmError::ImageDownload(e.to_string()))?
            .to_vec();

        let filename = format!("image_{}.png", chrono::Utc::now().timestamp_millis());
        self.save_best_effort(&filename, &data).await;

        Ok(ImageOutcome::Image(Attachment { filename, data }))
    }

    async fn save_best_effort(&self, filename: &str, data: &[u8]) {
        let Some(dir) = &self.images_dir else {
            return;
        };
        let path = dir.join(filename);
        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, data).await
        }
        .await;
        if let Err(error) = result {
            tracing::warn!(%error, path = %path.display(), "failed to save generated image");
        }
    }
}

/// First http(s) URL in `content`, if any.
pub fn extract_image_url(content: &str) -> Option<&str> {
    URL_PATTERN.find(content).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderKind;
    use crate::testing::ScriptedProvider;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(provider: Arc<ScriptedProvider>) -> ImageGenerator {
        ImageGenerator::new(
            Some(provider as Arc<dyn TextProvider>),
            Some("shapesinc/image-model".into()),
            1000,
            reqwest::Client::new(),
        )
    }

    #[test]
    fn extracts_first_url() {
        assert_eq!(
            extract_image_url("here you go https://cdn.example.com/a.png and https://b.example"),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(extract_image_url("no image today"), None);
    }

    #[tokio::test]
    async fn unconfigured_generator_errors() {
        let generator = ImageGenerator::new(None, None, 1000, reqwest::Client::new());
        assert!(!generator.is_configured());
        let error = generator.generate("a cat").await.unwrap_err();
        assert!(matches!(error, LlmError::ImageNotConfigured));
        assert_eq!(error.to_string(), "Image generation not configured");
    }

    #[tokio::test]
    async fn reply_without_url_is_no_image() {
        let provider = ScriptedProvider::replying(ProviderKind::Shapes, "I can't draw that", None);
        let outcome = generator(provider.clone()).generate("a cat").await.unwrap();

        assert!(matches!(outcome, ImageOutcome::NoImage(text) if text == "I can't draw that"));
        let requests = provider.requests();
        assert_eq!(requests[0].messages[0].content, "!imagine a cat");
        assert_eq!(requests[0].model, "shapesinc/image-model");
    }

    #[tokio::test]
    async fn downloads_and_saves_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ScriptedProvider::replying(
            ProviderKind::Shapes,
            &format!("Here: {}/cat.png", server.uri()),
            None,
        );
        let dir = tempfile::tempdir().unwrap();
        let outcome = generator(provider)
            .with_images_dir(dir.path().join("images"))
            .generate("a cat")
            .await
            .unwrap();

        let ImageOutcome::Image(attachment) = outcome else {
            panic!("expected an image");
        };
        assert_eq!(attachment.data, vec![1, 2, 3]);
        assert!(attachment.filename.starts_with("image_"));
        assert!(dir.path().join("images").join(&attachment.filename).exists());
    }
}
