//! Person-name normalization.
//!
//! A [`NormalizedName`] is the comparison key used by the lookup index, the
//! matching engine and the reconciler. Two raw names refer to the same person
//! for exact matching iff their keys are equal.

use std::fmt;

use serde::Serialize;

/// Generational suffixes dropped from the end of a name.
const SUFFIXES: &[&str] = &["JR", "SR", "II", "III", "IV"];

/// Characters removed outright. Hyphens are kept.
const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '\''];

/// Canonical comparison key for a person name. Empty means "unmatchable".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map a raw name to its comparison key.
///
/// Uppercases, trims, drops `.`, `,` and `'`, collapses whitespace, strips
/// trailing `JR`/`SR`/`II`/`III`/`IV` tokens, and puts the remaining tokens in
/// byte order (inner suffix tokens first) so `"SMITH, JOHN"` and
/// `"John Smith"` share a key. Absent or blank
/// input yields the empty key. Idempotent.
pub fn normalize(raw: Option<&str>) -> NormalizedName {
    let Some(raw) = raw else {
        return NormalizedName::default();
    };

    let upper = raw.to_uppercase();
    let cleaned: String = upper
        .trim()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // Only suffixes trailing the name as written are dropped. Any that remain
    // sort first, so a key never ends in a suffix and renormalizes unchanged.
    strip_suffixes(&mut tokens);
    tokens.sort_unstable_by_key(|t| (!is_suffix(t), *t));

    NormalizedName(tokens.join(" "))
}

fn is_suffix(token: &str) -> bool {
    SUFFIXES.contains(&token)
}

fn ends_with_suffix(tokens: &[&str]) -> bool {
    tokens.len() > 1 && tokens.last().is_some_and(|t| is_suffix(t))
}

/// Pop trailing suffix tokens, never the last remaining token.
fn strip_suffixes(tokens: &mut Vec<&str>) {
    while ends_with_suffix(tokens) {
        tokens.pop();
    }
}

/// Convenience for callers holding a plain `&str`.
pub fn normalize_str(raw: &str) -> NormalizedName {
    normalize(Some(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absent_and_blank_are_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize_str("").is_empty());
        assert!(normalize_str("   \t ").is_empty());
        assert!(normalize_str(" ., ' ").is_empty());
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        assert_eq!(normalize_str("Smith, John Jr."), normalize_str("SMITH JOHN JR"));
        assert_eq!(normalize_str("o'brien, pat"), normalize_str("OBRIEN PAT"));
    }

    #[test]
    fn hyphens_are_kept() {
        assert_eq!(normalize_str("Maria Garcia-Lopez").as_str(), "GARCIA-LOPEZ MARIA");
    }

    #[test]
    fn suffixes_are_stripped() {
        assert_eq!(normalize_str("Jane Doe III"), normalize_str("Jane Doe"));
        assert_eq!(normalize_str("Jane Doe iv."), normalize_str("Jane Doe"));
        assert_eq!(normalize_str("Jane Doe Jr III"), normalize_str("Jane Doe"));
    }

    #[test]
    fn suffix_only_inside_name_is_kept() {
        // "II" is not trailing, so it survives, ahead of the other tokens.
        assert_eq!(normalize_str("Ivy II Adams").as_str(), "II ADAMS IVY");
        assert_ne!(normalize_str("Aaron IV Beck"), normalize_str("Aaron Beck"));
        assert_eq!(normalize_str("Aaron IV Beck").as_str(), "IV AARON BECK");
    }

    #[test]
    fn lone_suffix_token_is_not_stripped() {
        assert_eq!(normalize_str("Jr.").as_str(), "JR");
    }

    #[test]
    fn leading_suffix_is_not_stripped() {
        let once = normalize_str("IV Adams");
        assert_eq!(once.as_str(), "IV ADAMS");
        assert_eq!(normalize_str(once.as_str()), once);
        assert_eq!(normalize_str("Adams IV").as_str(), "ADAMS");
    }

    #[test]
    fn token_order_is_canonical() {
        assert_eq!(normalize_str("John Smith"), normalize_str("SMITH, JOHN"));
        assert_eq!(normalize_str("  john    smith ").as_str(), "JOHN SMITH");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[A-Za-z\u{C0}-\u{FF} .,'\t-]{0,40}") {
            let once = normalize_str(&s);
            let twice = normalize_str(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn names_with_suffix_tokens_are_idempotent(
            words in proptest::collection::vec("(JR|SR|II|III|IV|[A-Za-z'.,-]{1,8})", 0..6)
        ) {
            let raw = words.join(" ");
            let once = normalize_str(&raw);
            prop_assert_eq!(normalize_str(once.as_str()), once);
        }
    }
}
