// AI implementation using OpenAI
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::{ChatRequest, ImageRequest, Message, OpenAIClient};

use super::{BaseAI, BaseImageGenerator, GeneratedImage, GPT_4O_MINI};

/// OpenAI implementation of AI capabilities
#[derive(Clone)]
pub struct OpenAiAdapter {
    client: OpenAIClient,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: OpenAIClient::new(api_key),
            model: GPT_4O_MINI.to_string(),
        }
    }

    /// Override the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn run(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let mut request = ChatRequest::new(self.model.as_str())
            .message(Message::user(prompt))
            .max_tokens(2500);

        if json_mode {
            request = request.json_object().temperature(0.3);
        } else {
            request = request.temperature(0.7);
        }

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            json_mode,
            "calling OpenAI chat completion"
        );

        let response = self
            .client
            .chat_text(request)
            .await
            .context("OpenAI completion failed")?;

        tracing::debug!(response_length = response.len(), "OpenAI response received");

        Ok(response)
    }
}

#[async_trait]
impl BaseAI for OpenAiAdapter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.run(prompt, false).await
    }

    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.run(prompt, true).await
    }
}

/// DALL-E 3 implementation of BaseImageGenerator.
pub struct DallEImageGenerator {
    client: OpenAIClient,
}

impl DallEImageGenerator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: OpenAIClient::new(api_key),
        }
    }
}

#[async_trait]
impl BaseImageGenerator for DallEImageGenerator {
    async fn generate(&self, prompt: &str, style: &str, size: &str) -> Result<GeneratedImage> {
        let request = ImageRequest::new(prompt).style(style).size(size);
        let quality_hd = request.quality.as_deref() == Some("hd");

        let response = self
            .client
            .generate_image(request)
            .await
            .context("DALL-E generation failed")?;

        let url = response
            .data
            .first()
            .and_then(|d| d.url.clone())
            .context("no image URL returned")?;

        Ok(GeneratedImage {
            url,
            // DALL-E 3 pricing per image.
            cost: if quality_hd { 0.08 } else { 0.04 },
        })
    }
}
