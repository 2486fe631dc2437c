//! In-memory doubles for every external collaborator.
//!
//! Unit and integration tests build a `ServerDeps` from these mocks so the
//! pipeline can be driven end-to-end without network access. Each mock
//! records its calls for assertions.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::{
    BaseAI, BaseContentExtractor, BaseImageGenerator, BaseNotifier, BaseStockImageSearch,
    ExtractedContent, GeneratedImage, ServerDeps,
};

// =============================================================================
// AI
// =============================================================================

/// Scripted AI double. Responses are matched by prompt substring, in
/// registration order; unmatched prompts get the default response.
#[derive(Default)]
pub struct MockAI {
    rules: RwLock<Vec<(String, String)>>,
    failures: RwLock<Vec<String>>,
    default_response: RwLock<Option<String>>,
    pub calls: AtomicUsize,
}

impl MockAI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` when the prompt contains `needle`.
    pub fn respond_when(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules
            .write()
            .unwrap()
            .push((needle.into(), response.into()));
    }

    /// Fail when the prompt contains `needle`.
    pub fn fail_when(&self, needle: impl Into<String>) {
        self.failures.write().unwrap().push(needle.into());
    }

    /// Response for prompts no rule matches.
    pub fn respond_default(&self, response: impl Into<String>) {
        *self.default_response.write().unwrap() = Some(response.into());
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for needle in self.failures.read().unwrap().iter() {
            if prompt.contains(needle.as_str()) {
                return Err(anyhow!("mock AI failure for '{needle}'"));
            }
        }

        for (needle, response) in self.rules.read().unwrap().iter() {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }

        self.default_response
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("mock AI has no response for prompt"))
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor double returning a fixed document.
pub struct MockExtractor {
    result: RwLock<Option<ExtractedContent>>,
    pub calls: AtomicUsize,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self {
            result: RwLock::new(Some(ExtractedContent {
                title: "Extracted Headline".to_string(),
                paragraphs: vec![
                    "First extracted paragraph with plenty of source material.".to_string(),
                    "Second extracted paragraph continuing the story in detail.".to_string(),
                    "Third extracted paragraph wrapping up the coverage.".to_string(),
                ],
            })),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_result(&self, content: ExtractedContent) {
        *self.result.write().unwrap() = Some(content);
    }

    /// Make every extraction fail.
    pub fn fail(&self) {
        *self.result.write().unwrap() = None;
    }
}

#[async_trait]
impl BaseContentExtractor for MockExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("mock extraction failure for {url}"))
    }
}

// =============================================================================
// Images
// =============================================================================

#[derive(Default)]
pub struct MockStockSearch {
    pub queries: RwLock<Vec<String>>,
}

#[async_trait]
impl BaseStockImageSearch for MockStockSearch {
    async fn search(&self, query: &str) -> Result<String> {
        let mut queries = self.queries.write().unwrap();
        queries.push(query.to_string());
        Ok(format!("https://stock.example.com/{}.jpg", queries.len()))
    }
}

#[derive(Default)]
pub struct MockImageGenerator {
    pub prompts: RwLock<Vec<String>>,
}

#[async_trait]
impl BaseImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str, _style: &str, _size: &str) -> Result<GeneratedImage> {
        let mut prompts = self.prompts.write().unwrap();
        prompts.push(prompt.to_string());
        Ok(GeneratedImage {
            url: format!("https://generated.example.com/{}.png", prompts.len()),
            cost: 0.08,
        })
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Notifier double recording every message.
#[derive(Default)]
pub struct MockNotifier {
    pub messages: RwLock<Vec<(i64, String)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_for(&self, chat_id: i64) -> Vec<String> {
        self.messages
            .read()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.messages
            .write()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        _buttons: &[(String, String)],
    ) -> Result<()> {
        self.send(chat_id, text).await
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// All mocks plus the `ServerDeps` built over them.
pub struct TestDependencies {
    pub ai: Arc<MockAI>,
    pub extractor: Arc<MockExtractor>,
    pub stock_images: Arc<MockStockSearch>,
    pub image_generator: Arc<MockImageGenerator>,
    pub notifier: Arc<MockNotifier>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            ai: Arc::new(MockAI::new()),
            extractor: Arc::new(MockExtractor::new()),
            stock_images: Arc::new(MockStockSearch::default()),
            image_generator: Arc::new(MockImageGenerator::default()),
            notifier: Arc::new(MockNotifier::new()),
        }
    }

    /// Build a `ServerDeps` backed by these mocks.
    pub fn server_deps(&self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            self.ai.clone(),
            self.extractor.clone(),
            self.stock_images.clone(),
            self.image_generator.clone(),
            self.notifier.clone(),
            "https://newsdesk.test".to_string(),
        )
    }
}
