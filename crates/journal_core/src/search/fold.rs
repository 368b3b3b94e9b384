//! Case- and diacritic-insensitive folding.
//!
//! # Invariants
//! - Folding is idempotent: `fold(fold(x)) == fold(x)`.
//! - Folded text never contains control characters, so stored search
//!   columns cannot be matched across a separator.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds `text` for substring matching.
///
/// Decomposes to NFD, drops combining marks, lowercases and removes
/// control characters. `"Février"` and `"fevrier"` fold to the same value.
pub fn fold_search_text(text: &str) -> String {
    text.nfd()
        .filter(|ch| !is_combining_mark(*ch) && !ch.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes user filter input.
///
/// Returns `None` for missing, empty or whitespace-only input, which means
/// "no filter" rather than "match nothing".
pub fn normalize_filter(filter: Option<&str>) -> Option<String> {
    let trimmed = filter?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let folded = fold_search_text(trimmed);
    if folded.is_empty() {
        None
    } else {
        Some(folded)
    }
}

#[cfg(test)]
mod tests {
    use super::{fold_search_text, normalize_filter};

    #[test]
    fn fold_ignores_case_and_diacritics() {
        assert_eq!(fold_search_text("Février 2024"), "fevrier 2024");
        assert_eq!(fold_search_text("OCTOBER"), "october");
        assert_eq!(fold_search_text("Ñandú"), "nandu");
    }

    #[test]
    fn fold_is_idempotent() {
        let once = fold_search_text("Décembre 2023");
        assert_eq!(fold_search_text(&once), once);
    }

    #[test]
    fn normalize_filter_treats_blank_as_no_filter() {
        assert_eq!(normalize_filter(None), None);
        assert_eq!(normalize_filter(Some("")), None);
        assert_eq!(normalize_filter(Some("   \t")), None);
        assert_eq!(normalize_filter(Some(" Oct ")).as_deref(), Some("oct"));
    }
}
