//! Per-chat publishing preferences.
//!
//! Durable store is the sole source of truth (workers are stateless).
//! Lookup order: the chat's own row, then the operator-managed global
//! defaults row (`chat_id = 0`), then built-in defaults. Rows are created
//! lazily on first save and only ever overwritten, never deleted.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Reserved chat id whose row holds operator-managed global defaults.
pub const GLOBAL_DEFAULTS_CHAT_ID: i64 = 0;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "content_style", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStyle {
    #[default]
    Journalistic,
    KeepAsIs,
    SeoOptimized,
    Academic,
    Casual,
    Technical,
}

impl ContentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStyle::Journalistic => "journalistic",
            ContentStyle::KeepAsIs => "keep_as_is",
            ContentStyle::SeoOptimized => "seo_optimized",
            ContentStyle::Academic => "academic",
            ContentStyle::Casual => "casual",
            ContentStyle::Technical => "technical",
        }
    }

    /// Parse a user-supplied style name (the `/style` command accepts the
    /// short `seo` alias).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "journalistic" => Some(ContentStyle::Journalistic),
            "keep_as_is" | "keep-as-is" => Some(ContentStyle::KeepAsIs),
            "seo" | "seo_optimized" => Some(ContentStyle::SeoOptimized),
            "academic" => Some(ContentStyle::Academic),
            "casual" => Some(ContentStyle::Casual),
            "technical" => Some(ContentStyle::Technical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "images_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ImagesSource {
    /// No strategy chosen: policy decides the stock/generated mix.
    #[default]
    Auto,
    Stock,
    Generated,
    None,
}

impl ImagesSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(ImagesSource::Auto),
            "stock" | "unsplash" => Some(ImagesSource::Stock),
            "generated" | "ai" => Some(ImagesSource::Generated),
            "none" => Some(ImagesSource::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "interface_language", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterfaceLanguage {
    #[default]
    Ru,
    En,
    Pl,
}

impl InterfaceLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceLanguage::Ru => "ru",
            InterfaceLanguage::En => "en",
            InterfaceLanguage::Pl => "pl",
        }
    }

    /// Normalize a raw language code (e.g. Telegram's `language_code`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        if normalized.starts_with("ru") {
            Some(InterfaceLanguage::Ru)
        } else if normalized.starts_with("en") {
            Some(InterfaceLanguage::En)
        } else if normalized.starts_with("pl") {
            Some(InterfaceLanguage::Pl)
        } else {
            None
        }
    }
}

// ============================================================================
// Preferences Model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub chat_id: i64,
    pub content_style: ContentStyle,
    pub images_count: i16,
    pub images_source: ImagesSource,
    pub auto_publish: bool,
    pub interface_language: InterfaceLanguage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PREFERENCE_COLUMNS: &str = "chat_id, content_style, images_count, images_source, \
     auto_publish, interface_language, created_at, updated_at";

impl Preferences {
    /// Built-in defaults; `fallback_language` seeds the interface language
    /// from the submitter's client locale when no row exists yet.
    pub fn defaults(chat_id: i64, fallback_language: Option<InterfaceLanguage>) -> Self {
        let now = Utc::now();
        Self {
            chat_id,
            content_style: ContentStyle::Journalistic,
            images_count: 2,
            images_source: ImagesSource::Auto,
            auto_publish: true,
            interface_language: fallback_language.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Load preferences for a chat: own row, global defaults row, or
    /// built-in defaults, in that order. Never fails on a missing row.
    pub async fn load(
        chat_id: i64,
        fallback_language: Option<InterfaceLanguage>,
        pool: &PgPool,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Self>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM chat_preferences WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        if let Some(mut prefs) = row {
            prefs.chat_id = chat_id;
            return Ok(prefs);
        }

        if chat_id != GLOBAL_DEFAULTS_CHAT_ID {
            let global = sqlx::query_as::<_, Self>(&format!(
                "SELECT {PREFERENCE_COLUMNS} FROM chat_preferences WHERE chat_id = $1"
            ))
            .bind(GLOBAL_DEFAULTS_CHAT_ID)
            .fetch_optional(pool)
            .await?;

            if let Some(mut prefs) = global {
                prefs.chat_id = chat_id;
                return Ok(prefs);
            }
        }

        Ok(Self::defaults(chat_id, fallback_language))
    }

    /// Upsert the preferences row for this chat.
    pub async fn save(&self, pool: &PgPool) -> Result<Self> {
        let saved = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO chat_preferences (
                chat_id, content_style, images_count, images_source,
                auto_publish, interface_language
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (chat_id) DO UPDATE SET
                content_style = EXCLUDED.content_style,
                images_count = EXCLUDED.images_count,
                images_source = EXCLUDED.images_source,
                auto_publish = EXCLUDED.auto_publish,
                interface_language = EXCLUDED.interface_language,
                updated_at = NOW()
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(self.chat_id)
        .bind(self.content_style)
        .bind(self.images_count)
        .bind(self.images_source)
        .bind(self.auto_publish)
        .bind(self.interface_language)
        .fetch_one(pool)
        .await?;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_publishing_policy() {
        let prefs = Preferences::defaults(42, None);
        assert_eq!(prefs.content_style, ContentStyle::Journalistic);
        assert_eq!(prefs.images_count, 2);
        assert_eq!(prefs.images_source, ImagesSource::Auto);
        assert!(prefs.auto_publish);
        assert_eq!(prefs.interface_language, InterfaceLanguage::Ru);
    }

    #[test]
    fn defaults_take_client_language() {
        let prefs = Preferences::defaults(42, Some(InterfaceLanguage::Pl));
        assert_eq!(prefs.interface_language, InterfaceLanguage::Pl);
    }

    #[test]
    fn style_parsing_accepts_aliases() {
        assert_eq!(ContentStyle::parse("SEO"), Some(ContentStyle::SeoOptimized));
        assert_eq!(ContentStyle::parse("keep-as-is"), Some(ContentStyle::KeepAsIs));
        assert_eq!(ContentStyle::parse("newsy"), None);
    }

    #[test]
    fn images_source_parsing_accepts_provider_names() {
        assert_eq!(ImagesSource::parse("unsplash"), Some(ImagesSource::Stock));
        assert_eq!(ImagesSource::parse("ai"), Some(ImagesSource::Generated));
        assert_eq!(ImagesSource::parse("off"), None);
    }

    #[test]
    fn language_parsing_normalizes_locale_codes() {
        assert_eq!(InterfaceLanguage::parse("en-US"), Some(InterfaceLanguage::En));
        assert_eq!(InterfaceLanguage::parse("pl"), Some(InterfaceLanguage::Pl));
        assert_eq!(InterfaceLanguage::parse("de"), None);
    }
}
