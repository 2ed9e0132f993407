//! URL slug derivation for titles.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid slug separator regex"));

/// Derives a lowercase, dash-separated slug from a title.
///
/// Letters and digits of any script are kept; every other run collapses to
/// one `-`. Returns an empty string when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    NON_WORD_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_punctuation_and_whitespace() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Rust -- 2024 Edition"), "rust-2024-edition");
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(slugify("博客 文章"), "博客-文章");
    }

    #[test]
    fn punctuation_only_title_yields_empty_slug() {
        assert_eq!(slugify("?!"), "");
    }
}
