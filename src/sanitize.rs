//! Filename cleanup that folds accented Latin text down to plain ASCII.

use unicode_normalization::{UnicodeNormalization, char::canonical_combining_class};

/// Reduces `name` to `[A-Za-z0-9 ._]` and trims surrounding whitespace.
///
/// The input is NFKD-decomposed first and every combining mark dropped, so
/// `"café"` becomes `"cafe"` instead of `"caf"`. Scripts with no Latin
/// decomposition vanish entirely and may leave an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .filter(|c| is_allowed(*c))
        .collect();
    kept.trim().to_string()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_')
}
