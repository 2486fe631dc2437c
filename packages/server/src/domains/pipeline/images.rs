//! Image sourcing stage.
//!
//! One smart-prompt AI call per article derives the visual plan consumed by
//! both providers, so stock and generated images stay thematically
//! consistent. Sourcing follows the configured strategy; with no explicit
//! strategy and two images requested, the mix is fixed at one stock plus one
//! generated. Individual provider failures degrade the image count rather
//! than failing the job.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::transform::{extract_json, DraftArticle};
use crate::domains::settings::ImagesSource;
use crate::kernel::ServerDeps;

/// Stop words skipped when falling back to title keywords.
const TITLE_STOP_WORDS: [&str; 15] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from",
];

/// Tags used to build one stock query.
const STOCK_QUERY_TAGS: usize = 4;

/// Visual plan shared by both image providers.
#[derive(Debug, Clone, Deserialize)]
pub struct SmartImagePlan {
    #[serde(default)]
    pub hero_prompt: String,
    #[serde(default)]
    pub content_prompts: Vec<String>,
    #[serde(default)]
    pub stock_tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub visual_style: String,
    #[serde(default)]
    pub color_palette: String,
}

/// Where an image descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Stock,
    Generated,
}

/// One sourced image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    pub source: ImageOrigin,
    pub prompt_or_tags: String,
    pub alt: String,
}

fn build_smart_prompt(draft: &DraftArticle) -> String {
    let preview: String = draft.content.chars().take(500).collect();

    format!(
        r#"You are an expert visual content curator. Analyze this article and generate image prompts.

Title: "{title}"
Category: {category}
Excerpt: "{excerpt}"

Content preview:
"{preview}"

Generate a JSON response with:
1. hero_prompt: one compelling prompt for the main article image
2. content_prompts: 2-3 diverse prompts for images within the article
3. stock_tags: 8-12 specific, searchable stock-photo tags (2-3 words each)
4. keywords: 5-7 main keywords from the article
5. visual_style: recommended visual style (e.g. "modern minimalist")
6. color_palette: suggested color mood (e.g. "cool blues and whites")

Prompts must be specific to THIS article, visually descriptive, and diverse
from each other. Return valid JSON only."#,
        title = draft.title,
        category = draft.category,
        excerpt = draft.excerpt,
    )
}

/// Keyword extraction used when the smart-prompt call fails.
pub fn title_keywords(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|word| word.len() > 3 && !TITLE_STOP_WORDS.contains(&word.as_str()))
        .take(7)
        .collect()
}

fn fallback_plan(draft: &DraftArticle) -> SmartImagePlan {
    let keywords = title_keywords(&draft.title);

    SmartImagePlan {
        hero_prompt: format!("{} {}", draft.title, draft.category),
        content_prompts: vec![format!(
            "A professional illustration of {}, modern style, high quality",
            draft.title.to_lowercase()
        )],
        stock_tags: {
            let mut tags = keywords.clone();
            tags.push(draft.category.clone());
            tags
        },
        keywords,
        visual_style: "modern professional".to_string(),
        color_palette: "vibrant technology colors".to_string(),
    }
}

/// Derive the visual plan. Never fails: a broken AI call degrades to the
/// deterministic keyword plan.
pub async fn smart_prompts(deps: &ServerDeps, draft: &DraftArticle) -> SmartImagePlan {
    let prompt = build_smart_prompt(draft);

    match deps.ai.complete_json(&prompt).await {
        Ok(response) => match serde_json::from_str::<SmartImagePlan>(extract_json(&response)) {
            Ok(mut plan) => {
                if plan.hero_prompt.trim().is_empty() {
                    plan.hero_prompt = draft.title.clone();
                }
                if plan.stock_tags.is_empty() {
                    plan.stock_tags = title_keywords(&draft.title);
                }
                plan.content_prompts.truncate(3);
                plan.stock_tags.truncate(12);
                plan.keywords.truncate(7);
                plan
            }
            Err(e) => {
                warn!(error = %e, "smart prompt response malformed, using fallback plan");
                fallback_plan(draft)
            }
        },
        Err(e) => {
            warn!(error = %e, "smart prompt call failed, using fallback plan");
            fallback_plan(draft)
        }
    }
}

/// Stock search query from the plan's top tags.
pub fn build_stock_query(tags: &[String]) -> String {
    tags.iter()
        .take(STOCK_QUERY_TAGS)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Provider mix for a request. With an explicit strategy every slot uses
/// that provider; `auto` with exactly two images is fixed at one stock plus
/// one generated, and `auto` otherwise stays on stock.
pub fn plan_mix(count: i16, source: ImagesSource) -> Vec<ImageOrigin> {
    let count = count.clamp(0, 3) as usize;
    if count == 0 {
        return Vec::new();
    }

    match source {
        ImagesSource::None => Vec::new(),
        ImagesSource::Stock => vec![ImageOrigin::Stock; count],
        ImagesSource::Generated => vec![ImageOrigin::Generated; count],
        ImagesSource::Auto if count == 2 => vec![ImageOrigin::Stock, ImageOrigin::Generated],
        ImagesSource::Auto => vec![ImageOrigin::Stock; count],
    }
}

/// Source images for the article per the configured strategy.
pub async fn source_images(
    deps: &ServerDeps,
    draft: &DraftArticle,
    plan: &SmartImagePlan,
    count: i16,
    source: ImagesSource,
) -> Vec<ImageDescriptor> {
    let mix = plan_mix(count, source);
    if mix.is_empty() {
        return Vec::new();
    }

    let stock_query = build_stock_query(&plan.stock_tags);
    let mut descriptors = Vec::with_capacity(mix.len());

    for (index, origin) in mix.into_iter().enumerate() {
        let alt = if index == 0 {
            draft.title.clone()
        } else {
            format!("{} - illustration", draft.title)
        };

        let descriptor = match origin {
            ImageOrigin::Stock => match deps.stock_images.search(&stock_query).await {
                Ok(url) => Some(ImageDescriptor {
                    url,
                    source: ImageOrigin::Stock,
                    prompt_or_tags: stock_query.clone(),
                    alt,
                }),
                Err(e) => {
                    warn!(query = %stock_query, error = %e, "stock image search failed");
                    None
                }
            },
            ImageOrigin::Generated => {
                let prompt = plan
                    .content_prompts
                    .get(index.saturating_sub(1))
                    .unwrap_or(&plan.hero_prompt)
                    .clone();

                match deps
                    .image_generator
                    .generate(&prompt, "natural", "1792x1024")
                    .await
                {
                    Ok(image) => {
                        debug!(cost = image.cost, "image generated");
                        Some(ImageDescriptor {
                            url: image.url,
                            source: ImageOrigin::Generated,
                            prompt_or_tags: prompt,
                            alt,
                        })
                    }
                    Err(e) => {
                        warn!(error = %e, "image generation failed");
                        None
                    }
                }
            }
        };

        if let Some(descriptor) = descriptor {
            descriptors.push(descriptor);
        }
    }

    descriptors
}
