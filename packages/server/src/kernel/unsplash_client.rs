//! Unsplash client implementation of BaseStockImageSearch
//!
//! With an access key, uses the official random-photo API. Without one,
//! falls back to a deterministic search-based image URL so the pipeline
//! still produces a usable descriptor in keyless environments.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::BaseStockImageSearch;

/// Crop applied to every stock result (3:2, sized for article hero slots).
const IMAGE_CROP: &str = "w=1200&h=800&fit=crop";

/// Keyless placeholder base. Rows carrying one of these are treated as
/// having a default image by the dedup selector.
pub const DEFAULT_IMAGE_BASE: &str = "https://images.unsplash.com/photo-1";

#[derive(Debug, Deserialize)]
struct RandomPhotoResponse {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    raw: String,
}

/// Unsplash stock photo search.
pub struct UnsplashClient {
    client: reqwest::Client,
    access_key: Option<String>,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key,
        }
    }

    fn fallback_url(query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{DEFAULT_IMAGE_BASE}?q={encoded}&{IMAGE_CROP}")
    }
}

#[async_trait]
impl BaseStockImageSearch for UnsplashClient {
    async fn search(&self, query: &str) -> Result<String> {
        let Some(access_key) = &self.access_key else {
            debug!(query = %query, "no Unsplash key, using search-based fallback URL");
            return Ok(Self::fallback_url(query));
        };

        let response = self
            .client
            .get("https://api.unsplash.com/photos/random")
            .query(&[("query", query), ("orientation", "landscape")])
            .header("Authorization", format!("Client-ID {access_key}"))
            .send()
            .await
            .context("Unsplash request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Unsplash API error: {status}");
        }

        let photo: RandomPhotoResponse = response
            .json()
            .await
            .context("Failed to parse Unsplash response")?;

        Ok(format!("{}&{IMAGE_CROP}", photo.urls.raw))
    }
}
