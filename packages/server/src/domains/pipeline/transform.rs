//! AI rewrite stage.
//!
//! Takes extracted or raw source material and produces a styled, categorized
//! article draft. Prompt assembly is a closed set of named styles plus an
//! optional free-text override carried in its own labeled section, so
//! override text can extend but never displace the structural instructions.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::common::text::{clean_generated_content, strip_wrapping_quotes, truncate_at_word, word_count};
use crate::domains::settings::ContentStyle;
use crate::kernel::BaseAI;

/// Categories the transform may assign.
pub const VALID_CATEGORIES: [&str; 7] =
    ["ai", "tech", "gadgets", "software", "hardware", "internet", "security"];

/// Category used when the model returns something off-list.
pub const DEFAULT_CATEGORY: &str = "tech";

/// Excerpt character budget.
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Style selection plus an optional submitter-supplied refinement.
#[derive(Debug, Clone)]
pub struct StyleDirective {
    pub style: ContentStyle,
    pub override_text: Option<String>,
}

impl StyleDirective {
    pub fn new(style: ContentStyle) -> Self {
        Self {
            style,
            override_text: None,
        }
    }

    /// Base instruction text for the selected style.
    pub fn base_instructions(&self) -> &'static str {
        match self.style {
            ContentStyle::Journalistic => {
                "Write in engaging, professional journalistic style for a wide audience. \
                 Clear, informative, and accessible. Create a cohesive narrative that flows \
                 naturally from introduction through key points to conclusion."
            }
            ContentStyle::KeepAsIs => {
                "Keep the original writing style and tone. Make minimal changes, only fix \
                 grammar and formatting. Preserve the author's voice."
            }
            ContentStyle::SeoOptimized => {
                "Optimize for SEO: use keywords naturally, create descriptive sections, \
                 include relevant terms. Focus on search engine visibility while keeping a \
                 well-structured narrative."
            }
            ContentStyle::Academic => {
                "Write in formal, scientific academic style. Use precise terminology, \
                 maintain a scholarly tone, and build a structured, logical argument."
            }
            ContentStyle::Casual => {
                "Write in friendly, conversational casual style. Use simple language, be \
                 approachable and engaging, like talking to a friend."
            }
            ContentStyle::Technical => {
                "Write in detailed, precise technical style. Use accurate terminology, \
                 explain technical concepts thoroughly, and cover specifications and \
                 implications in depth."
            }
        }
    }

    /// Full style block for the prompt: base instructions, then the optional
    /// override under its own heading.
    pub fn render(&self) -> String {
        match &self.override_text {
            Some(extra) if !extra.trim().is_empty() => format!(
                "{}\nADDITIONAL GUIDANCE (does not replace the rules above): {}",
                self.base_instructions(),
                extra.trim()
            ),
            _ => self.base_instructions().to_string(),
        }
    }
}

/// Structured output of the rewrite stage.
#[derive(Debug, Clone)]
pub struct DraftArticle {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub word_count: usize,
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    title: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
    category: Option<String>,
}

/// Clamp a model-supplied category to the closed set.
pub fn validate_category(category: Option<&str>) -> String {
    match category {
        Some(value) => {
            let normalized = value.trim().to_lowercase();
            if VALID_CATEGORIES.contains(&normalized.as_str()) {
                normalized
            } else {
                DEFAULT_CATEGORY.to_string()
            }
        }
        None => DEFAULT_CATEGORY.to_string(),
    }
}

fn build_rewrite_prompt(source: &str, user_title: Option<&str>, directive: &StyleDirective) -> String {
    let title_instruction = match user_title {
        Some(title) => format!("Create an engaging version of: \"{title}\""),
        None => "Create a compelling headline from the core facts".to_string(),
    };

    format!(
        r#"You are a professional tech journalist. Read the source material and create a COMPLETELY NEW article about the same topic, in your own words.

SOURCE MATERIAL (for facts only):
---
{source}
---

RULES:
- Do not copy phrases from the source; every sentence must be your own.
- Skip website noise: calls to action, source credits, UI text, author bios.
- LENGTH: 400-600 words.
- LANGUAGE: English only (translate any foreign text).
- FORMAT: plain text paragraphs separated by blank lines, no markdown syntax.
- STYLE: {style}
- TITLE: {title_instruction}

OUTPUT (JSON only, nothing else):
{{
  "title": "Your rewritten headline IN ENGLISH",
  "content": "Your completely rewritten article IN PLAIN TEXT",
  "excerpt": "Your 1-2 sentence summary, max 160 chars",
  "category": "ai|tech|gadgets|software|hardware|internet|security"
}}"#,
        style = directive.render(),
    )
}

/// Pull the JSON object out of a completion that may be fenced.
pub(crate) fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Run the rewrite stage.
pub async fn transform(
    ai: &dyn BaseAI,
    source: &str,
    user_title: Option<&str>,
    directive: &StyleDirective,
) -> Result<DraftArticle> {
    let prompt = build_rewrite_prompt(source, user_title, directive);

    tracing::debug!(
        source_length = source.len(),
        style = directive.style.as_str(),
        "running rewrite stage"
    );

    let response = ai
        .complete_json(&prompt)
        .await
        .context("content generation call failed")?;

    let raw: RawDraft = serde_json::from_str(extract_json(&response))
        .context("content generation returned malformed JSON")?;

    let content = clean_generated_content(raw.content.as_deref().unwrap_or_default());
    if content.is_empty() {
        return Err(anyhow!("content generation returned empty output"));
    }

    let title = raw
        .title
        .as_deref()
        .map(strip_wrapping_quotes)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| user_title.map(str::to_string))
        .unwrap_or_else(|| "Untitled Article".to_string());

    let excerpt = match raw.excerpt.as_deref().map(strip_wrapping_quotes) {
        Some(excerpt) if !excerpt.is_empty() => truncate_at_word(excerpt, EXCERPT_MAX_CHARS),
        _ => truncate_at_word(&content, EXCERPT_MAX_CHARS),
    };

    let words = word_count(&content);
    let category = validate_category(raw.category.as_deref());

    tracing::info!(title = %title, words, category = %category, "rewrite stage completed");

    Ok(DraftArticle {
        title,
        content,
        excerpt,
        category,
        word_count: words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockAI;

    #[test]
    fn category_validation_clamps_to_known_set() {
        assert_eq!(validate_category(Some("AI")), "ai");
        assert_eq!(validate_category(Some("blockchain")), "tech");
        assert_eq!(validate_category(None), "tech");
    }

    #[test]
    fn override_is_appended_not_substituted() {
        let directive = StyleDirective {
            style: ContentStyle::Technical,
            override_text: Some("mention the benchmark numbers".to_string()),
        };
        let rendered = directive.render();
        assert!(rendered.starts_with(directive.base_instructions()));
        assert!(rendered.contains("ADDITIONAL GUIDANCE"));
        assert!(rendered.contains("benchmark numbers"));
    }

    #[test]
    fn empty_override_renders_base_only() {
        let directive = StyleDirective {
            style: ContentStyle::Casual,
            override_text: Some("   ".to_string()),
        };
        assert_eq!(directive.render(), directive.base_instructions());
    }

    #[test]
    fn extract_json_unwraps_fences() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn transform_parses_and_cleans_response() {
        let ai = MockAI::new();
        ai.respond_default(
            r###"{"title":"\"New Chip Arrives\"","content":"## Intro\n\nThe **chip** is fast.\n\nIt ships soon.","excerpt":"A fast chip.","category":"hardware"}"###,
        );

        let draft = transform(
            &ai,
            "source text about a chip",
            None,
            &StyleDirective::new(ContentStyle::Journalistic),
        )
        .await
        .unwrap();

        assert_eq!(draft.title, "New Chip Arrives");
        assert_eq!(draft.category, "hardware");
        assert!(!draft.content.contains("##"));
        assert!(!draft.content.contains("**"));
        assert_eq!(draft.excerpt, "A fast chip.");
        assert!(draft.word_count > 0);
    }

    #[tokio::test]
    async fn transform_rejects_empty_content() {
        let ai = MockAI::new();
        ai.respond_default(r#"{"title":"T","content":"","excerpt":"","category":"tech"}"#);

        let result = transform(
            &ai,
            "source",
            None,
            &StyleDirective::new(ContentStyle::Journalistic),
        )
        .await;

        assert!(result.is_err());
    }
}
