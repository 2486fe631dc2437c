//! Integration tests for the preferences store.

mod common;

use common::TestHarness;
use test_context::test_context;

use server_core::domains::settings::{
    ContentStyle, ImagesSource, InterfaceLanguage, Preferences, GLOBAL_DEFAULTS_CHAT_ID,
};

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_row_yields_builtin_defaults(ctx: &mut TestHarness) {
    let prefs = Preferences::load(555, None, &ctx.db_pool).await.unwrap();

    assert_eq!(prefs.chat_id, 555);
    assert_eq!(prefs.content_style, ContentStyle::Journalistic);
    assert_eq!(prefs.images_count, 2);
    assert_eq!(prefs.images_source, ImagesSource::Auto);
    assert!(prefs.auto_publish);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn fallback_language_seeds_defaults(ctx: &mut TestHarness) {
    let prefs = Preferences::load(555, Some(InterfaceLanguage::Pl), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(prefs.interface_language, InterfaceLanguage::Pl);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn global_defaults_row_applies_to_unknown_chats(ctx: &mut TestHarness) {
    let mut global = Preferences::defaults(GLOBAL_DEFAULTS_CHAT_ID, None);
    global.content_style = ContentStyle::Technical;
    global.images_count = 1;
    global.save(&ctx.db_pool).await.unwrap();

    let prefs = Preferences::load(777, None, &ctx.db_pool).await.unwrap();
    assert_eq!(prefs.chat_id, 777, "loaded prefs are rebound to the caller's chat");
    assert_eq!(prefs.content_style, ContentStyle::Technical);
    assert_eq!(prefs.images_count, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn own_row_wins_over_global_defaults(ctx: &mut TestHarness) {
    let mut global = Preferences::defaults(GLOBAL_DEFAULTS_CHAT_ID, None);
    global.content_style = ContentStyle::Technical;
    global.save(&ctx.db_pool).await.unwrap();

    let mut own = Preferences::defaults(888, None);
    own.content_style = ContentStyle::Casual;
    own.save(&ctx.db_pool).await.unwrap();

    let prefs = Preferences::load(888, None, &ctx.db_pool).await.unwrap();
    assert_eq!(prefs.content_style, ContentStyle::Casual);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn save_is_an_upsert(ctx: &mut TestHarness) {
    let mut prefs = Preferences::defaults(999, None);
    prefs.save(&ctx.db_pool).await.unwrap();

    prefs.images_source = ImagesSource::Generated;
    prefs.auto_publish = false;
    let saved = prefs.save(&ctx.db_pool).await.unwrap();

    assert_eq!(saved.images_source, ImagesSource::Generated);
    assert!(!saved.auto_publish);

    let reloaded = Preferences::load(999, None, &ctx.db_pool).await.unwrap();
    assert_eq!(reloaded.images_source, ImagesSource::Generated);
    assert!(!reloaded.auto_publish);
}
