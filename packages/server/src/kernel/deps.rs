//! Server dependencies for the pipeline (using traits for testability)
//!
//! This module provides the central dependency container handed to job
//! handlers and HTTP routes. All external services use trait abstractions to
//! enable testing.

use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::{
    BaseAI, BaseContentExtractor, BaseImageGenerator, BaseNotifier, BaseStockImageSearch,
};

/// Server dependencies accessible to job handlers and routes.
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// AI client for rewriting, translation and smart image prompts.
    pub ai: Arc<dyn BaseAI>,
    /// URL content extractor (fetch + structural selectors).
    pub extractor: Arc<dyn BaseContentExtractor>,
    /// Stock photo search.
    pub stock_images: Arc<dyn BaseStockImageSearch>,
    /// Generative image provider.
    pub image_generator: Arc<dyn BaseImageGenerator>,
    /// Chat-directed status notifications.
    pub notifier: Arc<dyn BaseNotifier>,
    /// Absolute base URL for published article links.
    pub site_base_url: String,
}

impl ServerDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        ai: Arc<dyn BaseAI>,
        extractor: Arc<dyn BaseContentExtractor>,
        stock_images: Arc<dyn BaseStockImageSearch>,
        image_generator: Arc<dyn BaseImageGenerator>,
        notifier: Arc<dyn BaseNotifier>,
        site_base_url: String,
    ) -> Self {
        Self {
            db_pool,
            ai,
            extractor,
            stock_images,
            image_generator,
            notifier,
            site_base_url,
        }
    }
}
