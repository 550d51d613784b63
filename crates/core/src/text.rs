//! Product description formatting for menu cards.

use std::sync::LazyLock;

use regex::Regex;

/// Shown when a product has no description at all.
pub const DEFAULT_DESCRIPTION: &str = "Fresh and delicious food prepared with love";

/// Card descriptions are cut to this many characters.
pub const SHORT_DESCRIPTION_LENGTH: usize = 80;

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

/// Remove HTML tags left behind by the rich-text editor.
#[must_use]
pub fn strip_html(input: &str) -> String {
    HTML_TAG_RE.replace_all(input, "").trim().to_owned()
}

/// Shorten a description for a product card.
///
/// Tags are stripped first. Text longer than `max_chars` is cut at the last
/// space inside the limit and suffixed with `...`. Missing or blank input
/// yields [`DEFAULT_DESCRIPTION`].
#[must_use]
pub fn truncate_description(description: Option<&str>, max_chars: usize) -> String {
    let clean = description.map(strip_html).unwrap_or_default();
    if clean.is_empty() {
        return DEFAULT_DESCRIPTION.to_owned();
    }

    if clean.chars().count() <= max_chars {
        return clean;
    }

    let head: String = clean.chars().take(max_chars).collect();
    let cut = head.rsplit_once(' ').map_or(head.as_str(), |(before, _)| before);
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_uses_default() {
        assert_eq!(truncate_description(None, 80), DEFAULT_DESCRIPTION);
        assert_eq!(truncate_description(Some("  "), 80), DEFAULT_DESCRIPTION);
        assert_eq!(truncate_description(Some("<p></p>"), 80), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_short_text_is_untouched_apart_from_tags() {
        assert_eq!(
            truncate_description(Some("<p>Crispy <b>cod</b> fillet</p>"), 80),
            "Crispy cod fillet"
        );
    }

    #[test]
    fn test_long_text_cuts_on_word_boundary() {
        let text = "Slow cooked chicken karahi with fresh tomatoes, green chillies and ginger served with naan";
        let short = truncate_description(Some(text), SHORT_DESCRIPTION_LENGTH);
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= SHORT_DESCRIPTION_LENGTH + 3);
        let body = short.trim_end_matches("...");
        assert!(text.starts_with(body));
        assert!(text[body.len()..].starts_with(' '));
    }

    #[test]
    fn test_long_word_without_spaces_is_hard_cut() {
        let text = "x".repeat(100);
        let short = truncate_description(Some(&text), 10);
        assert_eq!(short, format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn test_multibyte_text_is_cut_on_chars() {
        let text = "مزیدار بریانی ".repeat(10);
        let short = truncate_description(Some(&text), 20);
        assert!(short.chars().count() <= 23);
    }
}
