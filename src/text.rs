//! Comparison keys for case- and accent-insensitive matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case `text`, decompose it and drop every combining mark.
///
/// Lower-casing happens first so that marks introduced by case mapping
/// (`İ` lower-cases to `i` + U+0307) are stripped in the same pass, which keeps
/// the function idempotent.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// [`normalize`] for optional fields; absent input yields an empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("Cadáver"), "cadaver");
        assert_eq!(normalize("CIGÜEÑA"), "ciguena");
        assert_eq!(normalize("Ave Rapaz"), normalize("ave rapaz"));
    }

    #[test]
    fn absent_input_is_empty() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("Búho")), "buho");
    }

    #[test]
    fn dotted_capital_i_is_stable() {
        let once = normalize("İzmir");
        assert_eq!(once, "izmir");
        assert_eq!(normalize(&once), once);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[\\p{Latin}\\p{Greek}0-9 .,-]{0,32}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
