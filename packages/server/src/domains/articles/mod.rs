//! Article records, the canonical-version selector, and publishing.

pub mod model;
pub mod publisher;
pub mod selector;

pub use model::{Article, LocalizedContent};
pub use publisher::{publish_article, PublishOutcome};
pub use selector::{score, select_canonical};

use serde::{Deserialize, Serialize};

/// Languages every article is published in. `En` is the pipeline's source
/// language; the rest are produced by the translation fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleLanguage {
    En,
    Pl,
}

impl ArticleLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleLanguage::En => "en",
            ArticleLanguage::Pl => "pl",
        }
    }

    /// Human-readable language name, for translation prompts.
    pub fn name(&self) -> &'static str {
        match self {
            ArticleLanguage::En => "English",
            ArticleLanguage::Pl => "Polish",
        }
    }
}

/// Language the pipeline rewrites into before translating.
pub const SOURCE_LANGUAGE: ArticleLanguage = ArticleLanguage::En;

/// All languages an article record carries.
pub const TARGET_LANGUAGES: [ArticleLanguage; 2] = [ArticleLanguage::En, ArticleLanguage::Pl];
