//! Dual-language article publishing.
//!
//! Builds one article row from the per-language content map and inserts it
//! atomically -- either the whole record lands or nothing does. Slugs for
//! every language derive from the source-language title so the language
//! variants of one logical article stay correlated.

use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::info;

use super::model::{Article, LocalizedContent};
use super::{ArticleLanguage, SOURCE_LANGUAGE, TARGET_LANGUAGES};
use crate::common::slug::language_slug;
use crate::common::text::word_count;

/// The inserted row plus absolute per-language URLs.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub article: Article,
    pub urls: BTreeMap<ArticleLanguage, String>,
}

/// Absolute URL for one language variant.
pub fn article_url(base_url: &str, lang: ArticleLanguage, slug: &str) -> String {
    format!(
        "{}/{}/article/{}",
        base_url.trim_end_matches('/'),
        lang.as_str(),
        slug
    )
}

/// Persist the finished article record.
///
/// `localized` must contain an entry for every target language; the
/// translation stage guarantees this (failed languages fall back to source
/// content there, not here).
pub async fn publish_article(
    pool: &PgPool,
    localized: &BTreeMap<ArticleLanguage, LocalizedContent>,
    category: &str,
    image_url: Option<String>,
    tags: Vec<String>,
    published: bool,
    base_url: &str,
) -> Result<PublishOutcome> {
    let source = localized
        .get(&SOURCE_LANGUAGE)
        .ok_or_else(|| anyhow!("missing source-language content"))?;

    for lang in TARGET_LANGUAGES {
        if !localized.contains_key(&lang) {
            return Err(anyhow!("missing {} content", lang.as_str()));
        }
    }

    let en = &localized[&ArticleLanguage::En];
    let pl = &localized[&ArticleLanguage::Pl];

    let mut article = Article::builder()
        .title(source.title.clone())
        .slug_en(language_slug(&source.title, "en"))
        .content_en(en.content.clone())
        .excerpt_en(en.excerpt.clone())
        .slug_pl(language_slug(&source.title, "pl"))
        .content_pl(pl.content.clone())
        .excerpt_pl(pl.excerpt.clone())
        .category(category)
        .tags(tags)
        .published(published)
        .word_count(word_count(&source.content) as i32)
        .build();
    article.image_url = image_url;

    let inserted = article
        .insert(pool)
        .await
        .context("failed to persist article record")?;

    let urls = TARGET_LANGUAGES
        .iter()
        .map(|&lang| (lang, article_url(base_url, lang, inserted.slug(lang))))
        .collect();

    info!(
        article_id = %inserted.id,
        slug_en = %inserted.slug_en,
        published = inserted.published,
        word_count = inserted.word_count,
        "article persisted"
    );

    Ok(PublishOutcome {
        article: inserted,
        urls,
    })
}
