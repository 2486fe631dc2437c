//! Thin Telegram Bot API client.
//!
//! Covers the two calls the server needs: `sendMessage` (HTML parse mode,
//! optional inline keyboard) and `answerCallbackQuery`. No update polling --
//! updates arrive via webhook and are parsed by the server.

use reqwest::Client;
use serde_json::json;
use thiserror::Error;

pub mod models;

use crate::models::{ApiResponse, InlineKeyboard, SentMessage};

/// Errors returned by the Telegram client.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
}

/// Telegram Bot API client.
#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{token}/{method}",
            token = self.options.bot_token
        )
    }

    /// Send an HTML-formatted message to a chat.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<SentMessage> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });

        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(&keyboard)
                .map_err(|e| TelegramError::Api(e.to_string()))?;
        }

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TelegramError::Api(format!("sendMessage {status}: {detail}")));
        }

        let parsed: ApiResponse<SentMessage> = response.json().await?;
        match parsed.result {
            Some(message) if parsed.ok => Ok(message),
            _ => Err(TelegramError::Api(
                parsed.description.unwrap_or_else(|| "sendMessage rejected".into()),
            )),
        }
    }

    /// Acknowledge a callback query so the client stops showing a spinner.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }

        let response = self
            .client
            .post(self.method_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TelegramError::Api(format!(
                "answerCallbackQuery {status}: {detail}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token() {
        let service = TelegramService::new(TelegramOptions {
            bot_token: "123:abc".into(),
        });
        assert_eq!(
            service.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn keyboard_serializes_rows() {
        let keyboard = InlineKeyboard::default()
            .row(vec![models::InlineButton::new("English", "lang:en")])
            .row(vec![models::InlineButton::new("Polski", "lang:pl")]);

        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "lang:en");
        assert_eq!(value["inline_keyboard"][1][0]["text"], "Polski");
    }
}
