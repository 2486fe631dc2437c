//! Telegram webhook update payloads (the subset the gateway consumes).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub language_code: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<IncomingMessage>,
    pub data: Option<String>,
}

impl TelegramUpdate {
    /// Chat the update belongs to, if any.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|cb| cb.message.as_ref())
            .map(|m| m.chat.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_update() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 5,
                    "chat": {"id": 42},
                    "from": {"id": 7, "language_code": "en"},
                    "text": "/start"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(update.update_id, 10);
        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(update.message.unwrap().text.as_deref(), Some("/start"));
    }

    #[test]
    fn parses_callback_update() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{
                "update_id": 11,
                "callback_query": {
                    "id": "cb1",
                    "from": {"id": 7},
                    "message": {"message_id": 5, "chat": {"id": 42}},
                    "data": "lang:pl"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(
            update.callback_query.unwrap().data.as_deref(),
            Some("lang:pl")
        );
    }
}
