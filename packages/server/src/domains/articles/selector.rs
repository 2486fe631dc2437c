//! Canonical-version selection over duplicate article rows.
//!
//! Publishing is not guaranteed to produce exactly one row per logical
//! article: retries, re-edits and partial-failure recovery can leave
//! several rows sharing a slug. Every read path funnels a slug group
//! through `select_canonical` so all callers present the same version.
//!
//! Scoring is additive, not hard-priority: a long body with an excerpt can
//! outrank a custom image.

use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashSet;

use super::model::Article;
use super::ArticleLanguage;
use crate::kernel::DEFAULT_IMAGE_BASE;

/// Content length contributing to the score is capped here.
const CONTENT_SCORE_CAP: usize = 5000;

/// How many recent rows to pull per canonical row requested; slug groups
/// collapse, so listings over-fetch before reducing.
const CANDIDATE_FACTOR: i64 = 4;

/// Whether the row carries a deliberately chosen image (anything but the
/// keyless placeholder).
fn has_custom_image(article: &Article) -> bool {
    match article.image_url.as_deref() {
        Some(url) => !url.is_empty() && !url.starts_with(DEFAULT_IMAGE_BASE),
        None => false,
    }
}

/// Score one row for canonical selection in the given language.
pub fn score(article: &Article, lang: ArticleLanguage) -> i64 {
    let mut score = 0i64;

    if has_custom_image(article) {
        score += 100;
    }

    score += (article.content(lang).len().min(CONTENT_SCORE_CAP) / 50) as i64;

    if !article.excerpt(lang).trim().is_empty() {
        score += 10;
    }

    if article.featured {
        score += 2;
    }

    score
}

/// Reduce a group of rows sharing one logical identity to the canonical
/// row. Total: any non-empty input yields exactly one winner. Ties break
/// toward the most recently touched row.
pub fn select_canonical(rows: Vec<Article>, lang: ArticleLanguage) -> Option<Article> {
    rows.into_iter().max_by(|a, b| {
        score(a, lang)
            .cmp(&score(b, lang))
            .then(a.updated_at.cmp(&b.updated_at))
            .then(a.created_at.cmp(&b.created_at))
    })
}

/// Canonical article for a slug, or None when the slug is unknown.
pub async fn get_by_slug(
    lang: ArticleLanguage,
    slug: &str,
    pool: &PgPool,
) -> Result<Option<Article>> {
    let rows = Article::find_by_slug(lang, slug, pool).await?;
    Ok(select_canonical(rows, lang))
}

/// Reduce a row list to one canonical row per slug group, preserving
/// recency order.
fn canonicalize(rows: Vec<Article>, lang: ArticleLanguage) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<Article>> =
        std::collections::HashMap::new();

    for row in rows {
        let slug = row.slug(lang).to_string();
        if seen.insert(slug.clone()) {
            order.push(slug.clone());
        }
        groups.entry(slug).or_default().push(row);
    }

    order
        .into_iter()
        .filter_map(|slug| groups.remove(&slug).and_then(|g| select_canonical(g, lang)))
        .collect()
}

/// Recent published articles, one canonical row per slug.
pub async fn list_recent(
    lang: ArticleLanguage,
    limit: i64,
    pool: &PgPool,
) -> Result<Vec<Article>> {
    let rows = Article::list_recent_published(limit * CANDIDATE_FACTOR, pool).await?;
    let mut canonical = canonicalize(rows, lang);
    canonical.truncate(limit as usize);
    Ok(canonical)
}

/// Related articles: same category, excluding the current article's slug
/// group. Falls back to the globally most recent articles when the category
/// has no other members.
pub async fn related(
    current: &Article,
    lang: ArticleLanguage,
    limit: i64,
    pool: &PgPool,
) -> Result<Vec<Article>> {
    let candidates =
        Article::find_by_category(&current.category, limit * CANDIDATE_FACTOR, pool).await?;

    let mut same_category: Vec<Article> = canonicalize(candidates, lang)
        .into_iter()
        .filter(|a| a.slug(lang) != current.slug(lang))
        .collect();
    same_category.truncate(limit as usize);

    if !same_category.is_empty() {
        return Ok(same_category);
    }

    let mut recent: Vec<Article> = list_recent(lang, limit + 1, pool)
        .await?
        .into_iter()
        .filter(|a| a.slug(lang) != current.slug(lang))
        .collect();
    recent.truncate(limit as usize);

    Ok(recent)
}
