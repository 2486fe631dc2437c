//! Telegram-backed implementation of BaseNotifier.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use telegram::models::{InlineButton, InlineKeyboard};
use telegram::TelegramService;

use super::BaseNotifier;

/// Wrapper around TelegramService that implements the BaseNotifier trait
pub struct TelegramNotifier(pub Arc<TelegramService>);

impl TelegramNotifier {
    pub fn new(service: Arc<TelegramService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseNotifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.0
            .send_message(chat_id, text, None)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<()> {
        let mut keyboard = InlineKeyboard::default();
        for (label, data) in buttons {
            keyboard = keyboard.row(vec![InlineButton::new(label.as_str(), data.as_str())]);
        }

        self.0
            .send_message(chat_id, text, Some(keyboard))
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.0
            .answer_callback_query(callback_id, text)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}
