//! Category slug normalization.
//!
//! The menu page anchors each category section with a slug derived from the
//! category's display name, and the browser sends that slug back when it asks
//! for a single category. Both directions go through [`slugify`], so it must
//! stay deterministic.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix appended to every category slug.
pub const SLUG_SUFFIX: &str = "-section";

/// Slug used when a name has nothing left after normalization.
pub const FALLBACK_SLUG: &str = "general-section";

static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-_]+").expect("Invalid regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-]").expect("Invalid regex"));
static HYPHEN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("Invalid regex"));

/// Convert a category display name into its section slug.
///
/// ```
/// use cravely_core::slugify;
///
/// assert_eq!(slugify("Fish & Chips"), "fish-and-chips-section");
/// assert_eq!(slugify("  Wraps_&amp;_Rolls "), "wraps-and-rolls-section");
/// assert_eq!(slugify(""), "general-section");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name
        .to_lowercase()
        .replace("&amp;", "and")
        .replace('&', "and");

    let hyphenated = SEPARATOR_RUN_RE.replace_all(&lowered, "-");
    let stripped = DISALLOWED_RE.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN_RE.replace_all(&stripped, "-");
    let core = collapsed.trim_matches('-');

    if core.is_empty() {
        return FALLBACK_SLUG.to_owned();
    }

    format!("{core}{SLUG_SUFFIX}")
}

/// Whether `slug` addresses the category called `name`.
///
/// Accepts the full section slug as well as the short form without the
/// `-section` suffix that older menu links use (`fish-and-chips`).
#[must_use]
pub fn slug_matches(name: &str, slug: &str) -> bool {
    let wanted = slug.trim().to_lowercase();
    if wanted.is_empty() {
        return false;
    }

    let canonical = slugify(name);
    canonical == wanted || canonical.strip_suffix(SLUG_SUFFIX) == Some(wanted.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_well_formed(slug: &str) -> bool {
        slug.ends_with(SLUG_SUFFIX)
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(slugify("Fish & Chips"), "fish-and-chips-section");
        assert_eq!(slugify("Soups &amp; Salads"), "soups-and-salads-section");
    }

    #[test]
    fn test_empty_and_symbol_only_names_fall_back() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("   "), FALLBACK_SLUG);
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(slugify("BBQ -- Specials"), "bbq-specials-section");
        assert_eq!(slugify("hot__beverages"), "hot-beverages-section");
        assert_eq!(slugify("-Rice Box-"), "rice-box-section");
    }

    #[test]
    fn test_punctuation_and_non_ascii_are_dropped() {
        assert_eq!(slugify("Chef's Special!"), "chefs-special-section");
        assert_eq!(slugify("Café Latte"), "caf-latte-section");
        assert_eq!(slugify("Deals (2 for 1)"), "deals-2-for-1-section");
    }

    #[test]
    fn test_output_is_always_well_formed() {
        let samples = [
            "Fish & Chips",
            "",
            "Turkish Feast",
            "  ___  ",
            "New\tArrivals\n",
            "Ünïcödé Çategory",
            "&&&",
            "A-B_C D",
            "123",
            "slug-already-section",
        ];
        for name in samples {
            let slug = slugify(name);
            assert!(is_well_formed(&slug), "{name:?} -> {slug:?}");
            assert!(!slug.starts_with('-'), "{slug}");
            assert!(!slug.contains("--"), "{slug}");
        }
    }

    #[test]
    fn test_slugify_is_not_idempotent_because_of_suffix() {
        let once = slugify("Pasta");
        assert_eq!(once, "pasta-section");
        assert_eq!(slugify(&once), "pasta-section-section");
    }

    #[test]
    fn test_slug_matches_full_and_short_forms() {
        assert!(slug_matches("Fish & Chips", "fish-and-chips-section"));
        assert!(slug_matches("Fish & Chips", "fish-and-chips"));
        assert!(slug_matches("Fish & Chips", "Fish-And-Chips"));
        assert!(!slug_matches("Fish & Chips", "fish-chips"));
        assert!(!slug_matches("Fish & Chips", ""));
    }
}
