//! Source-language detection for arbitrary input text.
//!
//! Two signals combined: weighted stop-word voting across the Latin-script
//! languages, and a Cyrillic character ratio that overrides the vote when it
//! dominates the sample. Only the first 200 characters are inspected.

use lazy_static::lazy_static;
use regex::Regex;

/// Portion of the sample that must be Cyrillic to call the text Russian.
const CYRILLIC_RATIO_THRESHOLD: f64 = 0.15;

/// Sample length used for detection.
const SAMPLE_CHARS: usize = 200;

lazy_static! {
    static ref EN_WORDS: Regex =
        Regex::new(r"\b(the|and|or|is|are|was|were|have|has|will|would|could|should)\b").unwrap();
    static ref PL_WORDS: Regex =
        Regex::new(r"\b(że|jest|są|będzie|może|bardzo|tylko|przez|które|która)\b").unwrap();
    static ref DE_WORDS: Regex =
        Regex::new(r"\b(der|die|das|und|oder|ist|sind|war|waren|haben|wird)\b").unwrap();
    static ref RO_WORDS: Regex =
        Regex::new(r"\b(și|este|sunt|pentru|care|sau|mai|foarte|doar|prin)\b").unwrap();
    static ref CS_WORDS: Regex =
        Regex::new(r"\b(je|jsou|byl|byla|bylo|bude|může|velmi|pouze|které)\b").unwrap();
}

/// Detect the dominant language of `text`, returning an ISO 639-1 code.
///
/// Defaults to `"en"` when no signal is strong enough.
pub fn detect_language(text: &str) -> &'static str {
    let sample: String = text.chars().take(SAMPLE_CHARS).collect::<String>().to_lowercase();
    if sample.trim().is_empty() {
        return "en";
    }

    let total_chars = sample.chars().filter(|c| !c.is_whitespace()).count();
    let cyrillic_chars = sample
        .chars()
        .filter(|c| ('\u{0400}'..='\u{04FF}').contains(c))
        .count();

    // A dominant script is a stronger signal than any keyword vote.
    if total_chars > 0 && cyrillic_chars as f64 > total_chars as f64 * CYRILLIC_RATIO_THRESHOLD {
        return "ru";
    }

    let votes: [(&'static str, usize); 5] = [
        ("en", EN_WORDS.find_iter(&sample).count()),
        ("pl", PL_WORDS.find_iter(&sample).count()),
        ("de", DE_WORDS.find_iter(&sample).count()),
        ("ro", RO_WORDS.find_iter(&sample).count()),
        ("cs", CS_WORDS.find_iter(&sample).count()),
    ];

    let mut detected = "en";
    let mut max_votes = 0;
    for (lang, count) in votes {
        if count > max_votes {
            max_votes = count;
            detected = lang;
        }
    }

    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english() {
        assert_eq!(
            detect_language("The new chip is faster and it has more cores than the old one"),
            "en"
        );
    }

    #[test]
    fn detects_polish() {
        assert_eq!(
            detect_language("Nowy procesor jest bardzo szybki i może obsłużyć które zadania tylko przez chwilę"),
            "pl"
        );
    }

    #[test]
    fn detects_german() {
        assert_eq!(
            detect_language("Der neue Chip ist schneller und die Kerne sind besser als das alte Modell"),
            "de"
        );
    }

    #[test]
    fn cyrillic_ratio_overrides_keyword_votes() {
        // Latin stop words present, but the sample is mostly Cyrillic.
        assert_eq!(
            detect_language("the Новый процессор работает быстрее и поддерживает больше ядер"),
            "ru"
        );
    }

    #[test]
    fn empty_input_defaults_to_english() {
        assert_eq!(detect_language("   "), "en");
    }
}
