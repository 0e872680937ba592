use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::domain::TitleVariant;

/// URLs containing any of these count as plausibly score-related even when
/// neither the title nor the composer survives into the link text.
const GENERIC_KEYWORDS: &[&str] = &["piano", "arranged", "composer", "score", "sheet", "music"];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// Cheap pre-download filter: does this URL plausibly point at a score for
/// the target piece? Accepts when at least half the title tokens appear in
/// the decoded URL, or the composer's name (spaces removed) does, or a
/// generic score keyword does.
pub fn is_relevant(url: &str, variant: &TitleVariant, composer: &str) -> bool {
    let decoded = percent_decode_str(url)
        .decode_utf8()
        .map(|value| value.to_string())
        .unwrap_or_else(|_| url.to_string())
        .to_lowercase();

    let title = variant.text().to_lowercase();
    let words = word_pattern()
        .find_iter(&title)
        .map(|token| token.as_str())
        .collect::<Vec<_>>();
    if !words.is_empty() {
        let matched = words
            .iter()
            .filter(|word| decoded.contains(*word))
            .count();
        if matched * 2 >= words.len() {
            return true;
        }
    }

    let composer = composer.to_lowercase().replace(' ', "");
    if !composer.is_empty() && decoded.contains(&composer) {
        return true;
    }

    GENERIC_KEYWORDS
        .iter()
        .any(|keyword| decoded.contains(keyword))
}
