//! URL-safe slug generation for article permalinks.

/// Maximum slug length before the language suffix is appended.
const MAX_SLUG_LEN: usize = 60;

/// Build a URL-safe slug from a title: lowercase ASCII alphanumerics joined
/// by single hyphens, capped at 60 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress leading hyphen

    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Slug with a per-language suffix, e.g. `quantum-leap-en`.
pub fn language_slug(title: &str, lang: &str) -> String {
    format!("{}-{}", slugify(title), lang)
}
