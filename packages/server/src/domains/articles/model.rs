//! Article row model.
//!
//! One physical row per publish attempt. Retries, regenerations and manual
//! edits may leave several rows sharing a slug; read paths reduce each group
//! to one canonical row via `selector`. Rows are never merged or deleted
//! here -- cleanup is an out-of-band concern.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::ArticleLanguage;

/// Article content in one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedContent {
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Article {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub title: String,

    // Per-language content
    pub slug_en: String,
    pub content_en: String,
    #[builder(default)]
    pub excerpt_en: String,
    pub slug_pl: String,
    pub content_pl: String,
    #[builder(default)]
    pub excerpt_pl: String,

    // Metadata
    pub category: String,
    #[builder(default, setter(strip_option))]
    pub image_url: Option<String>,
    #[builder(default)]
    pub tags: Vec<String>,
    #[builder(default = "Telegram Bot".to_string())]
    pub author: String,

    // Flags
    #[builder(default = false)]
    pub featured: bool,
    #[builder(default = false)]
    pub published: bool,
    #[builder(default = 0)]
    pub word_count: i32,

    // Timestamps
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

pub(crate) const ARTICLE_COLUMNS: &str = "id, title, slug_en, content_en, excerpt_en, slug_pl, \
     content_pl, excerpt_pl, category, image_url, tags, author, featured, published, \
     word_count, created_at, updated_at";

impl Article {
    pub fn slug(&self, lang: ArticleLanguage) -> &str {
        match lang {
            ArticleLanguage::En => &self.slug_en,
            ArticleLanguage::Pl => &self.slug_pl,
        }
    }

    pub fn content(&self, lang: ArticleLanguage) -> &str {
        match lang {
            ArticleLanguage::En => &self.content_en,
            ArticleLanguage::Pl => &self.content_pl,
        }
    }

    pub fn excerpt(&self, lang: ArticleLanguage) -> &str {
        match lang {
            ArticleLanguage::En => &self.excerpt_en,
            ArticleLanguage::Pl => &self.excerpt_pl,
        }
    }

    /// Insert the article row.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let article = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO articles (
                {ARTICLE_COLUMNS}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.slug_en)
        .bind(&self.content_en)
        .bind(&self.excerpt_en)
        .bind(&self.slug_pl)
        .bind(&self.content_pl)
        .bind(&self.excerpt_pl)
        .bind(&self.category)
        .bind(&self.image_url)
        .bind(&self.tags)
        .bind(&self.author)
        .bind(self.featured)
        .bind(self.published)
        .bind(self.word_count)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(article)
    }

    /// All physical rows sharing a slug in the given language.
    pub async fn find_by_slug(
        lang: ArticleLanguage,
        slug: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let column = match lang {
            ArticleLanguage::En => "slug_en",
            ArticleLanguage::Pl => "slug_pl",
        };

        let rows = sqlx::query_as::<_, Self>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE {column} = $1"
        ))
        .bind(slug)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Recent published rows, newest first. May contain several rows per
    /// slug group; callers reduce with the selector.
    pub async fn list_recent_published(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE published = TRUE
            ORDER BY updated_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Recent published rows in a category, newest first.
    pub async fn find_by_category(category: &str, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE published = TRUE AND category = $1
            ORDER BY updated_at DESC
            LIMIT $2
            "#
        ))
        .bind(category)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Replace the hero image in place (regeneration path).
    pub async fn update_image(id: Uuid, image_url: &str, pool: &PgPool) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE articles SET image_url = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(image_url)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}
