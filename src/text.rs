//! Text folding shared by the lookup paths.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Removes diacritics: `"Ribeirão Preto"` becomes `"Ribeirao Preto"`.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Comparison key for deduplication: no diacritics, lowercase, single spaces.
pub fn normalize_label(text: &str) -> String {
    strip_diacritics(text)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps ASCII digits only.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Case and accent insensitive substring match.
pub fn matches_loosely(haystack: &str, needle: &str) -> bool {
    normalize_label(haystack).contains(&normalize_label(needle))
}
