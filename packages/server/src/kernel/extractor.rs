//! URL content extractor - local HTTP fetch + HTML parsing
//!
//! Uses reqwest for HTTP requests and the scraper crate for CSS-selector
//! extraction. Title and body are pulled with prioritized selector lists;
//! short fragments are discarded as likely navigation or boilerplate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use super::{BaseContentExtractor, ExtractedContent};

/// A title candidate shorter than this is ignored (site names, nav labels).
const MIN_TITLE_LEN: usize = 10;

/// Paragraphs at or below this length are treated as boilerplate.
const MIN_PARAGRAPH_LEN: usize = 50;

/// A body selector wins once it has yielded this many qualifying paragraphs.
const MIN_PARAGRAPHS: usize = 3;

/// Heading selectors, most specific first.
const TITLE_SELECTORS: [&str; 5] = ["h1", "article h1", ".article-title", "[class*=\"title\"]", "title"];

/// Body paragraph selectors, most specific first.
const CONTENT_SELECTORS: [&str; 6] = [
    "article p",
    ".article-content p",
    ".post-content p",
    "[class*=\"content\"] p",
    "main p",
    "p",
];

/// HTTP extractor using reqwest + scraper
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new() -> Result<Self> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .context("invalid accept header")?,
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().context("invalid accept-language header")?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch raw HTML from a URL
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response.text().await.context("Failed to read response body")
    }
}

/// Extract title and body paragraphs from an HTML document.
///
/// Pure function over the HTML string; the network fetch lives in
/// `HttpExtractor::extract`.
pub fn parse_article(html: &str) -> Result<ExtractedContent> {
    let document = Html::parse_document(html);

    let mut title = String::new();
    for selector_str in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if text.len() > MIN_TITLE_LEN {
                title = text;
                break;
            }
        }
    }

    // First selector reaching MIN_PARAGRAPHS wins; when none does, the
    // richest result still counts -- only zero qualifying paragraphs fails.
    let mut paragraphs: Vec<String> = Vec::new();
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let mut found: Vec<String> = Vec::new();
        for element in document.select(&selector) {
            let text = element.text().collect::<String>().trim().to_string();
            // Filter out short paragraphs (likely navigation/footer)
            if text.len() > MIN_PARAGRAPH_LEN {
                found.push(text);
            }
        }

        if found.len() >= MIN_PARAGRAPHS {
            paragraphs = found;
            break;
        }
        if found.len() > paragraphs.len() {
            paragraphs = found;
        }
    }

    if paragraphs.is_empty() {
        anyhow::bail!("No content found on page");
    }

    if title.is_empty() {
        title = "Untitled Article".to_string();
        warn!("no qualifying title found, using placeholder");
    }

    Ok(ExtractedContent { title, paragraphs })
}

#[async_trait]
impl BaseContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        debug!(url = %url, "extracting article content");

        let html = self.fetch_html(url).await?;
        let content = parse_article(&html)
            .with_context(|| format!("failed to extract content from {url}"))?;

        debug!(
            url = %url,
            title = %content.title,
            paragraphs = content.paragraphs.len(),
            "article content extracted"
        );

        Ok(content)
    }
}
