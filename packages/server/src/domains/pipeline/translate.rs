//! Translation fan-out stage.
//!
//! All non-source languages are translated in parallel. Failures are
//! isolated per language: a failed call falls back to the source-language
//! content instead of failing the job, so a translation outage degrades a
//! single language, never the whole pipeline.

use futures::future::join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::transform::{extract_json, EXCERPT_MAX_CHARS};
use crate::common::text::{strip_markdown, strip_wrapping_quotes, truncate_at_word};
use crate::domains::articles::{ArticleLanguage, LocalizedContent, SOURCE_LANGUAGE};
use crate::kernel::BaseAI;

#[derive(Debug, Deserialize)]
struct RawTranslation {
    title: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
}

fn build_translation_prompt(source: &LocalizedContent, lang: ArticleLanguage) -> String {
    format!(
        r#"Translate the following tech article from English to {language}.

TITLE:
{title}

CONTENT:
{content}

EXCERPT:
{excerpt}

REQUIREMENTS:
- Translate to natural, professional {language}
- Maintain technical terms appropriately
- Keep the same structure and tone

OUTPUT FORMAT (JSON):
{{
  "title": "translated title",
  "content": "translated content",
  "excerpt": "translated excerpt (max 200 characters)"
}}

Return ONLY valid JSON, no other text."#,
        language = lang.name(),
        title = source.title,
        content = source.content,
        excerpt = source.excerpt,
    )
}

/// Normalize one translated field set: drop wrapping quotes, strip stray
/// heading/bold markup the provider reintroduces, cap the excerpt at a word
/// boundary.
fn post_process(raw: RawTranslation, source: &LocalizedContent) -> LocalizedContent {
    let title = raw
        .title
        .as_deref()
        .map(strip_wrapping_quotes)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| source.title.clone());

    let content = match raw.content.as_deref() {
        Some(content) if !content.trim().is_empty() => strip_markdown(content),
        _ => source.content.clone(),
    };

    let excerpt = raw
        .excerpt
        .as_deref()
        .map(strip_wrapping_quotes)
        .filter(|e| !e.is_empty())
        .map(|e| truncate_at_word(e, EXCERPT_MAX_CHARS))
        .unwrap_or_else(|| truncate_at_word(&source.excerpt, EXCERPT_MAX_CHARS));

    LocalizedContent {
        title,
        content,
        excerpt,
    }
}

/// Translate the source content into one target language.
///
/// Any failure falls back to the source content for that language.
pub async fn translate_one(
    ai: &dyn BaseAI,
    source: &LocalizedContent,
    lang: ArticleLanguage,
) -> LocalizedContent {
    let prompt = build_translation_prompt(source, lang);

    match ai.complete_json(&prompt).await {
        Ok(response) => match serde_json::from_str::<RawTranslation>(extract_json(&response)) {
            Ok(raw) => {
                debug!(language = lang.as_str(), "translation completed");
                post_process(raw, source)
            }
            Err(e) => {
                warn!(language = lang.as_str(), error = %e, "translation returned malformed JSON, using source content");
                source.clone()
            }
        },
        Err(e) => {
            warn!(language = lang.as_str(), error = %e, "translation failed, using source content");
            source.clone()
        }
    }
}

/// Fan the source content out to every target language in parallel.
///
/// The returned map always contains an entry for each requested language
/// plus the source language itself.
pub async fn translate_all(
    ai: &dyn BaseAI,
    source: &LocalizedContent,
    languages: &[ArticleLanguage],
) -> BTreeMap<ArticleLanguage, LocalizedContent> {
    let mut localized = BTreeMap::new();
    localized.insert(SOURCE_LANGUAGE, source.clone());

    let pending: Vec<ArticleLanguage> = languages
        .iter()
        .copied()
        .filter(|lang| *lang != SOURCE_LANGUAGE)
        .collect();

    let translations = join_all(
        pending
            .iter()
            .map(|&lang| async move { (lang, translate_one(ai, source, lang).await) }),
    )
    .await;

    for (lang, content) in translations {
        localized.insert(lang, content);
    }

    localized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::articles::TARGET_LANGUAGES;
    use crate::kernel::test_dependencies::MockAI;

    fn source() -> LocalizedContent {
        LocalizedContent {
            title: "New Chip Arrives".to_string(),
            content: "The chip is fast.\n\nIt ships soon.".to_string(),
            excerpt: "A fast chip.".to_string(),
        }
    }

    #[tokio::test]
    async fn translates_non_source_languages() {
        let ai = MockAI::new();
        ai.respond_when(
            "Polish",
            r#"{"title":"Nowy procesor","content":"Procesor jest szybki.","excerpt":"Szybki procesor."}"#,
        );

        let localized = translate_all(&ai, &source(), &TARGET_LANGUAGES).await;

        assert_eq!(localized[&ArticleLanguage::En].title, "New Chip Arrives");
        assert_eq!(localized[&ArticleLanguage::Pl].title, "Nowy procesor");
    }

    #[tokio::test]
    async fn failed_language_falls_back_to_source() {
        let ai = MockAI::new();
        ai.fail_when("Polish");

        let localized = translate_all(&ai, &source(), &TARGET_LANGUAGES).await;

        assert_eq!(localized[&ArticleLanguage::Pl].title, "New Chip Arrives");
        assert_eq!(localized[&ArticleLanguage::Pl].content, source().content);
    }

    #[tokio::test]
    async fn malformed_json_falls_back_to_source() {
        let ai = MockAI::new();
        ai.respond_when("Polish", "not json at all");

        let localized = translate_all(&ai, &source(), &TARGET_LANGUAGES).await;

        assert_eq!(localized[&ArticleLanguage::Pl].content, source().content);
    }

    #[tokio::test]
    async fn post_processing_strips_quotes_and_markup() {
        let ai = MockAI::new();
        ai.respond_when(
            "Polish",
            r###"{"title":"\"Nowy procesor\"","content":"## Sekcja\n\n**Procesor** jest szybki.","excerpt":"Szybki."}"###,
        );

        let localized = translate_all(&ai, &source(), &TARGET_LANGUAGES).await;
        let pl = &localized[&ArticleLanguage::Pl];

        assert_eq!(pl.title, "Nowy procesor");
        assert!(!pl.content.contains("##"));
        assert!(!pl.content.contains("**"));
    }

    #[tokio::test]
    async fn long_excerpt_is_truncated_at_word_boundary() {
        let long_excerpt = "word ".repeat(60);
        let ai = MockAI::new();
        ai.respond_when(
            "Polish",
            format!(r#"{{"title":"T","content":"C","excerpt":"{long_excerpt}"}}"#),
        );

        let localized = translate_all(&ai, &source(), &TARGET_LANGUAGES).await;
        let excerpt = &localized[&ArticleLanguage::Pl].excerpt;

        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS + 1);
        assert!(excerpt.ends_with('…'));
    }
}
