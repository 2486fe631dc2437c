//! Localized user-facing messages (ru/en/pl).
//!
//! Every string the bot sends goes through `localize` keyed on the chat's
//! interface language. HTML parse mode; dynamic values are escaped.

use std::collections::BTreeMap;

use crate::domains::articles::ArticleLanguage;
use crate::domains::settings::{ImagesSource, InterfaceLanguage, Preferences};

/// Pick the variant for the interface language.
pub fn localize<'a>(lang: InterfaceLanguage, ru: &'a str, en: &'a str, pl: &'a str) -> &'a str {
    match lang {
        InterfaceLanguage::Ru => ru,
        InterfaceLanguage::En => en,
        InterfaceLanguage::Pl => pl,
    }
}

/// Escape text interpolated into HTML messages.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn start_message(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "👋 Пришлите ссылку или текст — я превращу их в готовую статью на двух языках.\n\nКоманды: /help /settings /language",
        "👋 Send me a link or raw text and I'll turn it into a finished dual-language article.\n\nCommands: /help /settings /language",
        "👋 Wyślij link lub tekst, a zamienię go w gotowy dwujęzyczny artykuł.\n\nKomendy: /help /settings /language",
    )
}

pub fn help_message(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "📖 <b>Как это работает</b>\n\n\
         Пришлите URL статьи или свой текст. Бот извлечёт контент, перепишет его, переведёт и опубликует.\n\n\
         <b>Команды:</b>\n\
         • /settings — текущие настройки\n\
         • /language ru|en|pl — язык интерфейса\n\
         • /style journalistic|keep_as_is|seo|academic|casual|technical\n\
         • /images 0|1|2|3\n\
         • /source stock|ai|auto|none\n\
         • /autopublish on|off",
        "📖 <b>How it works</b>\n\n\
         Send an article URL or your own text. The bot extracts the content, rewrites, translates and publishes it.\n\n\
         <b>Commands:</b>\n\
         • /settings — current settings\n\
         • /language ru|en|pl — interface language\n\
         • /style journalistic|keep_as_is|seo|academic|casual|technical\n\
         • /images 0|1|2|3\n\
         • /source stock|ai|auto|none\n\
         • /autopublish on|off",
        "📖 <b>Jak to działa</b>\n\n\
         Wyślij URL artykułu lub własny tekst. Bot wyodrębni treść, przepisze ją, przetłumaczy i opublikuje.\n\n\
         <b>Komendy:</b>\n\
         • /settings — bieżące ustawienia\n\
         • /language ru|en|pl — język interfejsu\n\
         • /style journalistic|keep_as_is|seo|academic|casual|technical\n\
         • /images 0|1|2|3\n\
         • /source stock|ai|auto|none\n\
         • /autopublish on|off",
    )
}

fn source_label(lang: InterfaceLanguage, source: ImagesSource) -> &'static str {
    match source {
        ImagesSource::Auto => localize(lang, "Авто (микс)", "Auto (mix)", "Auto (miks)"),
        ImagesSource::Stock => localize(lang, "Фотосток", "Stock photos", "Zdjęcia stockowe"),
        ImagesSource::Generated => localize(lang, "Генерация", "AI generated", "Generowane"),
        ImagesSource::None => localize(lang, "Без картинок", "No images", "Bez obrazów"),
    }
}

pub fn settings_message(prefs: &Preferences) -> String {
    let lang = prefs.interface_language;
    let publish_label = if prefs.auto_publish {
        localize(lang, "Автоматически", "Auto publish", "Auto publikacja")
    } else {
        localize(lang, "Черновик", "Draft", "Szkic")
    };

    format!(
        "{header}\n\n\
         {lang_label} {language}\n\
         {style_label} {style}\n\
         {images_label} {count}\n\
         {source_label_k} {source}\n\
         {publish_label_k} {publish}",
        header = localize(
            lang,
            "⚙️ <b>Настройки публикации</b>",
            "⚙️ <b>Publishing Settings</b>",
            "⚙️ <b>Ustawienia publikacji</b>"
        ),
        lang_label = localize(lang, "🌍 Язык:", "🌍 Interface:", "🌍 Język:"),
        language = prefs.interface_language.as_str(),
        style_label = localize(lang, "📝 Стиль:", "📝 Style:", "📝 Styl:"),
        style = prefs.content_style.as_str(),
        images_label = localize(lang, "🖼️ Картинок:", "🖼️ Images:", "🖼️ Obrazy:"),
        count = prefs.images_count,
        source_label_k = localize(lang, "📸 Источник:", "📸 Source:", "📸 Źródło:"),
        source = source_label(lang, prefs.images_source),
        publish_label_k = localize(lang, "🚀 Публикация:", "🚀 Publish mode:", "🚀 Tryb publikacji:"),
        publish = publish_label,
    )
}

pub fn queued_ack(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "⏳ Принято в обработку. Пришлю ссылки, когда статья будет готова.",
        "⏳ Queued for processing. I'll send links when the article is ready.",
        "⏳ Dodano do kolejki. Wyślę linki, gdy artykuł będzie gotowy.",
    )
}

pub fn validation_error(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "⚠️ Слишком короткий текст. Пришлите ссылку или текст длиннее 50 символов.",
        "⚠️ That text is too short. Send a link or text longer than 50 characters.",
        "⚠️ Tekst jest za krótki. Wyślij link lub tekst dłuższy niż 50 znaków.",
    )
}

/// Success notification with per-language links (or a draft notice).
pub fn success_message(
    lang: InterfaceLanguage,
    title: &str,
    urls: &BTreeMap<ArticleLanguage, String>,
    word_count: i32,
    images: usize,
    published: bool,
) -> String {
    let mut message = format!(
        "{header}\n\n<b>{title}</b>\n",
        header = localize(lang, "✅ Статья готова!", "✅ Article ready!", "✅ Artykuł gotowy!"),
        title = escape_html(title),
    );

    if published {
        for (article_lang, url) in urls {
            message.push_str(&format!(
                "• {}: {}\n",
                article_lang.as_str().to_uppercase(),
                url
            ));
        }
    } else {
        message.push_str(localize(
            lang,
            "📝 Сохранено как черновик (автопубликация выключена).\n",
            "📝 Saved as a draft (auto-publish is off).\n",
            "📝 Zapisano jako szkic (auto-publikacja wyłączona).\n",
        ));
    }

    message.push_str(&format!(
        "\n{words_label} {word_count} · {images_label} {images}",
        words_label = localize(lang, "Слов:", "Words:", "Słowa:"),
        images_label = localize(lang, "картинок:", "images:", "obrazy:"),
    ));

    message
}

/// Low-detail terminal failure notice; diagnostics stay on the job row.
pub fn failure_message(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "❌ Не удалось обработать материал. Попробуйте ещё раз чуть позже.",
        "❌ Processing failed. Please try again in a little while.",
        "❌ Przetwarzanie nie powiodło się. Spróbuj ponownie za chwilę.",
    )
}

pub fn language_menu_text(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "🌍 <b>Выберите язык интерфейса:</b>",
        "🌍 <b>Choose interface language:</b>",
        "🌍 <b>Wybierz język interfejsu:</b>",
    )
}

/// Inline keyboard rows for the language menu.
pub fn language_menu_buttons() -> Vec<(String, String)> {
    vec![
        ("🇷🇺 Русский".to_string(), "lang:ru".to_string()),
        ("🇬🇧 English".to_string(), "lang:en".to_string()),
        ("🇵🇱 Polski".to_string(), "lang:pl".to_string()),
    ]
}

pub fn language_saved(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "✅ Язык интерфейса сохранён.",
        "✅ Interface language saved.",
        "✅ Zapisano język interfejsu.",
    )
}

pub fn settings_saved(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "✅ Настройки сохранены.",
        "✅ Settings saved.",
        "✅ Ustawienia zapisane.",
    )
}

pub fn invalid_value(lang: InterfaceLanguage) -> &'static str {
    localize(
        lang,
        "⚠️ Некорректное значение. Посмотрите /help.",
        "⚠️ Invalid value. See /help.",
        "⚠️ Nieprawidłowa wartość. Zobacz /help.",
    )
}
