//! Infrastructure traits for external collaborators.
//!
//! Every network-bound dependency sits behind one of these traits so domain
//! code can be exercised against in-memory doubles (see
//! `kernel::test_dependencies`).

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// AI Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt expecting JSON response (returns raw JSON string)
    /// Parse with serde_json::from_str in calling code
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        // Default implementation calls complete
        self.complete(prompt).await
    }
}

// =============================================================================
// Content Extraction Trait (Infrastructure)
// =============================================================================

/// Title and body paragraphs extracted from a fetched page.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl ExtractedContent {
    /// Body paragraphs joined into a single text block.
    pub fn body(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

#[async_trait]
pub trait BaseContentExtractor: Send + Sync {
    /// Fetch a URL and extract a candidate title and body paragraphs.
    async fn extract(&self, url: &str) -> Result<ExtractedContent>;
}

// =============================================================================
// Image Provider Traits (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseStockImageSearch: Send + Sync {
    /// Search a stock-photo catalog, returning a direct image URL.
    async fn search(&self, query: &str) -> Result<String>;
}

/// A generated image with its provider cost in USD.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
    pub cost: f64,
}

#[async_trait]
pub trait BaseImageGenerator: Send + Sync {
    /// Generate an image from a prompt with the given style and size.
    async fn generate(&self, prompt: &str, style: &str, size: &str) -> Result<GeneratedImage>;
}

// =============================================================================
// Notifier Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Send an HTML-formatted status message to a chat.
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a message with an inline keyboard of `(label, callback_data)` buttons,
    /// one button per row.
    async fn send_menu(&self, chat_id: i64, text: &str, buttons: &[(String, String)])
        -> Result<()>;

    /// Acknowledge an inline-keyboard callback.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
