//! Pipeline orchestrator.
//!
//! Fixed-order state machine executed once per claimed job:
//! settings -> classify -> extract -> transform -> translate -> images ->
//! persist -> notify. Each stage error is tagged with the stage name before
//! it reaches the queue, so the job row records where processing broke.
//! Nothing is persisted unless the persist stage fully succeeds; the notify
//! stage is best-effort and never reverts a successful publish.

pub mod images;
pub mod transform;
pub mod translate;

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::common::lang::detect_language;
use crate::domains::activity::{log_activity, ActivityEntry};
use crate::domains::articles::{publisher, LocalizedContent, TARGET_LANGUAGES};
use crate::domains::intake::messages;
use crate::domains::settings::{ContentStyle, ImagesSource, InterfaceLanguage, Preferences};
use crate::kernel::ServerDeps;
use images::{smart_prompts, source_images};
use transform::{transform, StyleDirective};
use translate::translate_all;

/// Job type for submission processing.
pub const PROCESS_SUBMISSION: &str = "process_submission";

/// Raw text shorter than this is rejected before enqueue.
pub const MIN_TEXT_LENGTH: usize = 50;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Url,
    Text,
}

/// Per-submission overrides applied on top of the stored preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsOverride {
    pub content_style: Option<ContentStyle>,
    pub images_count: Option<i16>,
    pub images_source: Option<ImagesSource>,
    pub auto_publish: Option<bool>,
    /// Free-text style refinement; extends the style template, never
    /// replaces it (see `transform::StyleDirective`).
    pub style_prompt: Option<String>,
}

/// What the gateway enqueues: one submission, immutable once queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub chat_id: i64,
    pub message_id: Option<i64>,
    pub submitter_id: Option<i64>,
    pub kind: SubmissionKind,
    pub content: String,
    pub language_code: Option<String>,
    #[serde(default)]
    pub settings_override: Option<SettingsOverride>,
}

/// Distinguish a URL submission from raw text.
pub fn classify(content: &str) -> SubmissionKind {
    if URL_RE.is_match(content.trim()) {
        SubmissionKind::Url
    } else {
        SubmissionKind::Text
    }
}

fn stage_err(stage: &'static str, e: anyhow::Error) -> anyhow::Error {
    anyhow!("{stage}: {e:#}")
}

/// Run the full pipeline for one claimed submission. The returned JSON is
/// stored as the job result.
pub async fn process_submission(
    payload: SubmissionPayload,
    deps: &ServerDeps,
) -> Result<serde_json::Value> {
    info!(chat_id = payload.chat_id, kind = ?payload.kind, "pipeline starting");

    // Stage 1: resolve settings.
    let fallback_language = payload
        .language_code
        .as_deref()
        .and_then(InterfaceLanguage::parse);
    let mut settings = Preferences::load(payload.chat_id, fallback_language, &deps.db_pool)
        .await
        .map_err(|e| stage_err("settings", e))?;

    let mut style_prompt = None;
    if let Some(over) = &payload.settings_override {
        if let Some(style) = over.content_style {
            settings.content_style = style;
        }
        if let Some(count) = over.images_count {
            settings.images_count = count;
        }
        if let Some(source) = over.images_source {
            settings.images_source = source;
        }
        if let Some(publish) = over.auto_publish {
            settings.auto_publish = publish;
        }
        style_prompt = over.style_prompt.clone();
    }

    // Stage 2: classify input. The gateway pre-classifies for validation,
    // but the worker re-derives it: the queue payload is the only input a
    // stateless worker may trust.
    let kind = classify(&payload.content);

    // Stage 3: extract (URL submissions only).
    let (source_text, source_title) = match kind {
        SubmissionKind::Url => {
            let extracted = deps
                .extractor
                .extract(payload.content.trim())
                .await
                .map_err(|e| stage_err("extract", e))?;
            (extracted.body(), Some(extracted.title))
        }
        SubmissionKind::Text => (payload.content.clone(), None),
    };

    let source_language = detect_language(&source_text);
    info!(source_language, "input classified");

    // Stage 4: transform.
    let directive = StyleDirective {
        style: settings.content_style,
        override_text: style_prompt,
    };
    let draft = transform(
        deps.ai.as_ref(),
        &source_text,
        source_title.as_deref(),
        &directive,
    )
    .await
    .map_err(|e| stage_err("transform", e))?;

    // Stage 5: translate fan-out (per-language fallback inside).
    let source_content = LocalizedContent {
        title: draft.title.clone(),
        content: draft.content.clone(),
        excerpt: draft.excerpt.clone(),
    };
    let localized = translate_all(deps.ai.as_ref(), &source_content, &TARGET_LANGUAGES).await;

    // Stage 6: source images.
    let image_descriptors = if settings.images_count > 0 {
        let plan = smart_prompts(deps, &draft).await;
        source_images(
            deps,
            &draft,
            &plan,
            settings.images_count,
            settings.images_source,
        )
        .await
    } else {
        Vec::new()
    };

    // Stage 7: persist (all-or-nothing; no partial article rows).
    let plan_tags = images::title_keywords(&draft.title);
    let outcome = publisher::publish_article(
        &deps.db_pool,
        &localized,
        &draft.category,
        image_descriptors.first().map(|d| d.url.clone()),
        plan_tags,
        settings.auto_publish,
        &deps.site_base_url,
    )
    .await
    .map_err(|e| stage_err("persist", e))?;

    log_activity(
        &deps.db_pool,
        ActivityEntry::new(payload.chat_id, "article_published")
            .entity(outcome.article.id.to_string(), draft.title.clone())
            .metadata(json!({
                "category": draft.category,
                "word_count": draft.word_count,
                "published": outcome.article.published,
            })),
    )
    .await;

    // Stage 8: notify (best-effort; a failure here never reverts the publish).
    let notice = messages::success_message(
        settings.interface_language,
        &draft.title,
        &outcome.urls,
        outcome.article.word_count,
        image_descriptors.len(),
        outcome.article.published,
    );
    if let Err(e) = deps.notifier.send(payload.chat_id, &notice).await {
        warn!(chat_id = payload.chat_id, error = %e, "success notification failed");
    }

    Ok(json!({
        "article_id": outcome.article.id,
        "title": draft.title,
        "category": draft.category,
        "word_count": outcome.article.word_count,
        "published": outcome.article.published,
        "source_language": source_language,
        "urls": outcome
            .urls
            .iter()
            .map(|(lang, url)| (lang.as_str().to_string(), url.clone()))
            .collect::<std::collections::BTreeMap<_, _>>(),
        "images": image_descriptors,
    }))
}
