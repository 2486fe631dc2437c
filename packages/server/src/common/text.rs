//! Text post-processing for AI-produced article content.
//!
//! Generation and translation calls come back with markdown artifacts,
//! promotional boilerplate and wrapping quotes often enough that every piece
//! of provider output is run through these normalizers before persistence.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MD_HEADER: Regex = Regex::new(r"(?m)^#{1,6}\s+").unwrap();
    static ref MD_BOLD: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref MD_ITALIC: Regex = Regex::new(r"\*(.+?)\*").unwrap();
    static ref MD_BOLD_U: Regex = Regex::new(r"__(.+?)__").unwrap();
    static ref MD_ITALIC_U: Regex = Regex::new(r"_(.+?)_").unwrap();
    static ref MD_LINK: Regex = Regex::new(r"\[(.+?)\]\(.+?\)").unwrap();
    static ref MD_CODE: Regex = Regex::new(r"`(.+?)`").unwrap();
    static ref MD_LIST: Regex = Regex::new(r"(?m)^[-*+]\s+").unwrap();
    static ref MD_ORDERED: Regex = Regex::new(r"(?m)^\d+\.\s+").unwrap();
    static ref MD_QUOTE: Regex = Regex::new(r"(?m)^>\s+").unwrap();
    static ref MD_RULE: Regex = Regex::new(r"(?m)^---+$").unwrap();
    static ref EXTRA_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref TRAILING_SPACES: Regex = Regex::new(r"[ \t]+\n").unwrap();
    static ref LEADING_SPACES: Regex = Regex::new(r"\n[ \t]+").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"[ \t]{2,}").unwrap();

    /// Website-noise sentences that survive even explicit prompt instructions.
    static ref PROMO_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)stay with us.*?[.!]").unwrap(),
        Regex::new(r"(?i)follow us.*?[.!]").unwrap(),
        Regex::new(r"(?i)subscribe.*?channel.*?[.!]").unwrap(),
        Regex::new(r"(?i)join.*?newsletter.*?[.!]").unwrap(),
        Regex::new(r"(?i)google news.*?[.!]").unwrap(),
        Regex::new(r"(?i)source:.*?[.!]").unwrap(),
        Regex::new(r"(?i)via:.*?[.!]").unwrap(),
        Regex::new(r"(?i)written by.*?[.!]").unwrap(),
        Regex::new(r"(?i)share this.*?[.!]").unwrap(),
        Regex::new(r"(?i)like and.*?[.!]").unwrap(),
    ];
}

/// Strip all markdown syntax, leaving plain paragraphs.
pub fn strip_markdown(text: &str) -> String {
    let mut out = text.to_string();
    out = MD_HEADER.replace_all(&out, "").into_owned();
    out = MD_BOLD.replace_all(&out, "$1").into_owned();
    out = MD_BOLD_U.replace_all(&out, "$1").into_owned();
    out = MD_ITALIC.replace_all(&out, "$1").into_owned();
    out = MD_ITALIC_U.replace_all(&out, "$1").into_owned();
    out = MD_LINK.replace_all(&out, "$1").into_owned();
    out = MD_CODE.replace_all(&out, "$1").into_owned();
    out = MD_LIST.replace_all(&out, "").into_owned();
    out = MD_ORDERED.replace_all(&out, "").into_owned();
    out = MD_QUOTE.replace_all(&out, "").into_owned();
    out = MD_RULE.replace_all(&out, "").into_owned();
    out.trim().to_string()
}

/// Remove promotional/UI boilerplate sentences.
pub fn strip_promotional(text: &str) -> String {
    let mut out = text.to_string();
    for pattern in PROMO_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out
}

/// Collapse runs of whitespace: max two newlines, single spaces, no
/// leading/trailing space around line breaks.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = TRAILING_SPACES.replace_all(text, "\n").into_owned();
    out = LEADING_SPACES.replace_all(&out, "\n").into_owned();
    out = MULTI_SPACE.replace_all(&out, " ").into_owned();
    out = EXTRA_NEWLINES.replace_all(&out, "\n\n").into_owned();
    out.trim().to_string()
}

/// Full cleanup pass applied to generated article bodies.
pub fn clean_generated_content(text: &str) -> String {
    normalize_whitespace(&strip_promotional(&strip_markdown(text)))
}

/// Remove a single pair of wrapping quote characters the providers sometimes
/// emit around titles and excerpts.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    let quote_pairs = [('"', '"'), ('\u{201C}', '\u{201D}'), ('«', '»'), ('\'', '\'')];
    for (open, close) in quote_pairs {
        if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            return trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()].trim();
        }
    }
    trimmed
}

/// Truncate to at most `max_chars` characters, cutting at a word boundary
/// and appending an ellipsis when anything was dropped.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let truncated = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", truncated.trim_end_matches(['.', ',', ';', ':']))
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_headers_and_emphasis() {
        let input = "## Heading\n\nSome **bold** and *italic* text with [a link](https://x.com).";
        let cleaned = strip_markdown(input);
        assert_eq!(cleaned, "Heading\n\nSome bold and italic text with a link.");
    }

    #[test]
    fn strips_promotional_sentences() {
        let input = "Real news here. Subscribe to our channel today! More real news.";
        let cleaned = normalize_whitespace(&strip_promotional(input));
        assert!(!cleaned.contains("Subscribe"));
        assert!(cleaned.contains("Real news here."));
        assert!(cleaned.contains("More real news."));
    }

    #[test]
    fn normalizes_paragraph_breaks() {
        let input = "one\n\n\n\ntwo   three\t\tfour";
        assert_eq!(normalize_whitespace(input), "one\n\ntwo three four");
    }

    #[test]
    fn strips_wrapping_quotes_only_when_paired() {
        assert_eq!(strip_wrapping_quotes("\"Quoted title\""), "Quoted title");
        assert_eq!(strip_wrapping_quotes("«Cytat»"), "Cytat");
        assert_eq!(strip_wrapping_quotes("He said \"hi\" there"), "He said \"hi\" there");
    }

    #[test]
    fn truncates_at_word_boundary() {
        let text = "one two three four five";
        let cut = truncate_at_word(text, 12);
        assert_eq!(cut, "one two…");
        assert!(cut.chars().count() <= 13);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_at_word("short", 200), "short");
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("  one two\nthree  "), 3);
    }
}
