//! Integration tests for the intake gateway.

mod common;

use common::TestHarness;
use test_context::test_context;

use server_core::domains::intake::{handle_update, TelegramUpdate};
use server_core::domains::settings::{ContentStyle, InterfaceLanguage, Preferences};

const CHAT_ID: i64 = 9001;

fn message_update(update_id: i64, text: &str) -> TelegramUpdate {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": 1,
            "chat": {"id": CHAT_ID},
            "from": {"id": 7, "language_code": "en", "username": "tester"},
            "text": text
        }
    }))
    .unwrap()
}

fn callback_update(update_id: i64, data: &str) -> TelegramUpdate {
    serde_json::from_value(serde_json::json!({
        "update_id": update_id,
        "callback_query": {
            "id": "cb-1",
            "from": {"id": 7, "language_code": "en"},
            "message": {"message_id": 2, "chat": {"id": CHAT_ID}},
            "data": data
        }
    }))
    .unwrap()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn start_command_sends_welcome(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    handle_update(message_update(1, "/start"), &deps, queue.as_ref())
        .await
        .unwrap();

    let messages = ctx.mocks.notifier.messages_for(CHAT_ID);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("dual-language"));
    assert!(queue.list_recent(10).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn url_submission_is_enqueued_and_acknowledged(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    handle_update(
        message_update(2, "https://news.example.com/story"),
        &deps,
        queue.as_ref(),
    )
    .await
    .unwrap();

    let jobs = queue.list_recent(10).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["kind"], "url");
    assert_eq!(jobs[0].payload["chat_id"], CHAT_ID);

    let messages = ctx.mocks.notifier.messages_for(CHAT_ID);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Queued"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn short_text_is_rejected_without_creating_a_job(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    handle_update(message_update(3, "too short"), &deps, queue.as_ref())
        .await
        .unwrap();

    assert!(queue.list_recent(10).await.unwrap().is_empty());

    let messages = ctx.mocks.notifier.messages_for(CHAT_ID);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("too short"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn long_text_submission_is_enqueued(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    let text = "A detailed account of a new battery chemistry that survives five \
                thousand charge cycles while retaining most of its capacity.";
    handle_update(message_update(4, text), &deps, queue.as_ref())
        .await
        .unwrap();

    let jobs = queue.list_recent(10).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["kind"], "text");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_webhook_delivery_is_ignored(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    let update = message_update(5, "https://news.example.com/story");
    handle_update(update.clone(), &deps, queue.as_ref())
        .await
        .unwrap();
    handle_update(update, &deps, queue.as_ref()).await.unwrap();

    // Second delivery of the same update_id creates no second job and no
    // second acknowledgment.
    assert_eq!(queue.list_recent(10).await.unwrap().len(), 1);
    assert_eq!(ctx.mocks.notifier.messages_for(CHAT_ID).len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn style_command_persists_preference(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    handle_update(message_update(6, "/style technical"), &deps, queue.as_ref())
        .await
        .unwrap();

    let prefs = Preferences::load(CHAT_ID, None, &ctx.db_pool).await.unwrap();
    assert_eq!(prefs.content_style, ContentStyle::Technical);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn language_callback_saves_interface_language(ctx: &mut TestHarness) {
    let deps = ctx.deps();
    let queue = ctx.queue();

    handle_update(callback_update(7, "lang:pl"), &deps, queue.as_ref())
        .await
        .unwrap();

    let prefs = Preferences::load(CHAT_ID, None, &ctx.db_pool).await.unwrap();
    assert_eq!(prefs.interface_language, InterfaceLanguage::Pl);

    let messages = ctx.mocks.notifier.messages_for(CHAT_ID);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("język"));
}
