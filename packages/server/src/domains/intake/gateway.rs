//! Intake gateway: turns Telegram webhook updates into settings changes and
//! queued submissions.
//!
//! The gateway answers immediately -- commands are handled inline, content
//! submissions are validated and enqueued. Processing happens in the worker
//! regardless of how fast the webhook call returns; a dead worker's job is
//! recovered by the stale-lease sweep, never by the gateway.

use anyhow::Result;
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use super::messages;
use super::update::{CallbackQuery, IncomingMessage, TelegramUpdate};
use crate::domains::activity::{log_activity, ActivityEntry};
use crate::domains::pipeline::{
    classify, SubmissionKind, SubmissionPayload, MIN_TEXT_LENGTH, PROCESS_SUBMISSION,
};
use crate::domains::settings::{ContentStyle, ImagesSource, InterfaceLanguage, Preferences};
use crate::kernel::jobs::{JobQueue, DEFAULT_MAX_RETRIES};
use crate::kernel::ServerDeps;

/// SQLSTATE for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// Recognized slash commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Settings,
    Language(Option<InterfaceLanguage>),
    Style(Option<ContentStyle>),
    Images(Option<i16>),
    Source(Option<ImagesSource>),
    AutoPublish(Option<bool>),
}

/// Parse a slash command; None when the text is not a command.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next()?.trim_start_matches('/');
    // Strip the bot-mention suffix Telegram adds in groups.
    let name = name.split('@').next().unwrap_or(name).to_lowercase();
    let arg = parts.next();

    match name.as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "settings" => Some(Command::Settings),
        "language" => Some(Command::Language(arg.and_then(InterfaceLanguage::parse))),
        "style" => Some(Command::Style(arg.and_then(ContentStyle::parse))),
        "images" => Some(Command::Images(arg.and_then(|a| a.parse::<i16>().ok()))),
        "source" => Some(Command::Source(arg.and_then(ImagesSource::parse))),
        "autopublish" => Some(Command::AutoPublish(arg.and_then(|a| {
            match a.to_lowercase().as_str() {
                "on" => Some(true),
                "off" => Some(false),
                _ => None,
            }
        }))),
        _ => Some(Command::Help),
    }
}

/// Durable webhook dedup: record the update id, reporting whether it is new.
/// A missing table degrades to processing every delivery.
async fn record_update(pool: &PgPool, update_id: i64, chat_id: Option<i64>) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO telegram_updates (update_id, chat_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(update_id)
    .bind(chat_id)
    .execute(pool)
    .await;

    match result {
        Ok(outcome) => Ok(outcome.rows_affected() > 0),
        Err(e) => {
            let missing_table = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == UNDEFINED_TABLE)
                .unwrap_or(false);

            if missing_table {
                debug!("telegram_updates table missing, skipping webhook dedup");
                Ok(true)
            } else {
                Err(e.into())
            }
        }
    }
}

/// Entry point for one webhook delivery.
pub async fn handle_update(
    update: TelegramUpdate,
    deps: &ServerDeps,
    queue: &dyn JobQueue,
) -> Result<()> {
    let is_new = record_update(&deps.db_pool, update.update_id, update.chat_id()).await?;
    if !is_new {
        debug!(update_id = update.update_id, "duplicate webhook delivery ignored");
        return Ok(());
    }

    if let Some(callback) = update.callback_query {
        return handle_callback(callback, deps).await;
    }

    if let Some(message) = update.message {
        return handle_message(message, deps, queue).await;
    }

    debug!(update_id = update.update_id, "update carries no message, ignored");
    Ok(())
}

async fn handle_message(
    message: IncomingMessage,
    deps: &ServerDeps,
    queue: &dyn JobQueue,
) -> Result<()> {
    let chat_id = message.chat.id;
    let Some(text) = message.text.as_deref() else {
        debug!(chat_id, "non-text message ignored");
        return Ok(());
    };

    let language_code = message.from.as_ref().and_then(|u| u.language_code.clone());
    let fallback_language = language_code.as_deref().and_then(InterfaceLanguage::parse);
    let prefs = Preferences::load(chat_id, fallback_language, &deps.db_pool).await?;
    let ui_lang = prefs.interface_language;

    if let Some(command) = parse_command(text) {
        return handle_command(command, prefs, deps).await;
    }

    // Non-command payload: validate, then enqueue.
    let content = text.trim().to_string();
    let kind = classify(&content);
    if kind == SubmissionKind::Text && content.chars().count() < MIN_TEXT_LENGTH {
        deps.notifier
            .send(chat_id, messages::validation_error(ui_lang))
            .await?;
        return Ok(());
    }

    let payload = SubmissionPayload {
        chat_id,
        message_id: Some(message.message_id),
        submitter_id: message.from.as_ref().map(|u| u.id),
        kind,
        content,
        language_code,
        settings_override: None,
    };

    let job_id = queue
        .enqueue(
            PROCESS_SUBMISSION,
            serde_json::to_value(&payload)?,
            DEFAULT_MAX_RETRIES,
        )
        .await?;

    info!(chat_id, job_id = %job_id, kind = ?payload.kind, "submission enqueued");

    log_activity(
        &deps.db_pool,
        ActivityEntry::new(chat_id, "submission_received")
            .entity(job_id.to_string(), payload.content.chars().take(80).collect::<String>())
            .metadata(json!({"kind": payload.kind})),
    )
    .await;

    deps.notifier
        .send(chat_id, messages::queued_ack(ui_lang))
        .await?;

    Ok(())
}

async fn handle_command(command: Command, prefs: Preferences, deps: &ServerDeps) -> Result<()> {
    let chat_id = prefs.chat_id;
    let ui_lang = prefs.interface_language;

    match command {
        Command::Start => {
            deps.notifier
                .send(chat_id, messages::start_message(ui_lang))
                .await?;
        }
        Command::Help => {
            deps.notifier
                .send(chat_id, messages::help_message(ui_lang))
                .await?;
        }
        Command::Settings => {
            deps.notifier
                .send(chat_id, &messages::settings_message(&prefs))
                .await?;
        }
        Command::Language(None) => {
            deps.notifier
                .send_menu(
                    chat_id,
                    messages::language_menu_text(ui_lang),
                    &messages::language_menu_buttons(),
                )
                .await?;
        }
        Command::Language(Some(language)) => {
            let mut updated = prefs;
            updated.interface_language = language;
            updated.save(&deps.db_pool).await?;
            deps.notifier
                .send(chat_id, messages::language_saved(language))
                .await?;
        }
        Command::Style(Some(style)) => {
            let mut updated = prefs;
            updated.content_style = style;
            save_and_confirm(updated, deps).await?;
        }
        Command::Images(Some(count)) if (0..=3).contains(&count) => {
            let mut updated = prefs;
            updated.images_count = count;
            save_and_confirm(updated, deps).await?;
        }
        Command::Source(Some(source)) => {
            let mut updated = prefs;
            updated.images_source = source;
            save_and_confirm(updated, deps).await?;
        }
        Command::AutoPublish(Some(enabled)) => {
            let mut updated = prefs;
            updated.auto_publish = enabled;
            save_and_confirm(updated, deps).await?;
        }
        // A settings command with a missing or unparsable argument.
        Command::Style(None)
        | Command::Images(_)
        | Command::Source(None)
        | Command::AutoPublish(None) => {
            deps.notifier
                .send(chat_id, messages::invalid_value(ui_lang))
                .await?;
        }
    }

    Ok(())
}

async fn save_and_confirm(prefs: Preferences, deps: &ServerDeps) -> Result<()> {
    let chat_id = prefs.chat_id;
    let saved = prefs.save(&deps.db_pool).await?;

    log_activity(
        &deps.db_pool,
        ActivityEntry::new(chat_id, "settings_changed"),
    )
    .await;

    deps.notifier
        .send(chat_id, messages::settings_saved(saved.interface_language))
        .await?;
    deps.notifier
        .send(chat_id, &messages::settings_message(&saved))
        .await?;

    Ok(())
}

async fn handle_callback(callback: CallbackQuery, deps: &ServerDeps) -> Result<()> {
    let Some(chat_id) = callback.message.as_ref().map(|m| m.chat.id) else {
        warn!(callback_id = %callback.id, "callback without message, ignored");
        return Ok(());
    };

    let fallback_language = callback
        .from
        .language_code
        .as_deref()
        .and_then(InterfaceLanguage::parse);
    let prefs = Preferences::load(chat_id, fallback_language, &deps.db_pool).await?;

    match callback.data.as_deref() {
        Some("lang:menu") => {
            deps.notifier.answer_callback(&callback.id, None).await?;
            deps.notifier
                .send_menu(
                    chat_id,
                    messages::language_menu_text(prefs.interface_language),
                    &messages::language_menu_buttons(),
                )
                .await?;
        }
        Some(data) if data.starts_with("lang:") => {
            let Some(language) = InterfaceLanguage::parse(&data["lang:".len()..]) else {
                deps.notifier
                    .answer_callback(&callback.id, Some("invalid language"))
                    .await?;
                return Ok(());
            };

            let mut updated = prefs;
            updated.interface_language = language;
            updated.save(&deps.db_pool).await?;

            deps.notifier.answer_callback(&callback.id, None).await?;
            deps.notifier
                .send(chat_id, messages::language_saved(language))
                .await?;
        }
        other => {
            debug!(data = ?other, "unrecognized callback data, acknowledged");
            deps.notifier.answer_callback(&callback.id, None).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/settings"), Some(Command::Settings));
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_command("/language pl"),
            Some(Command::Language(Some(InterfaceLanguage::Pl)))
        );
        assert_eq!(
            parse_command("/style seo"),
            Some(Command::Style(Some(ContentStyle::SeoOptimized)))
        );
        assert_eq!(parse_command("/images 3"), Some(Command::Images(Some(3))));
        assert_eq!(
            parse_command("/source ai"),
            Some(Command::Source(Some(ImagesSource::Generated)))
        );
        assert_eq!(
            parse_command("/autopublish off"),
            Some(Command::AutoPublish(Some(false)))
        );
    }

    #[test]
    fn strips_bot_mention_suffix() {
        assert_eq!(parse_command("/settings@newsdesk_bot"), Some(Command::Settings));
    }

    #[test]
    fn invalid_arguments_parse_to_none() {
        assert_eq!(parse_command("/language de"), Some(Command::Language(None)));
        assert_eq!(parse_command("/images ten"), Some(Command::Images(None)));
    }

    #[test]
    fn non_commands_are_not_parsed() {
        assert_eq!(parse_command("just some text"), None);
        assert_eq!(parse_command("https://example.com"), None);
    }

    #[test]
    fn unknown_commands_fall_back_to_help() {
        assert_eq!(parse_command("/frobnicate"), Some(Command::Help));
    }
}
