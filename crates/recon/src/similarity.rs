use strsim::normalized_levenshtein;

/// Word-order-insensitive similarity on a 0..=100 scale.
///
/// Tokens of each side are sorted and rejoined with single spaces, then
/// compared by normalized Levenshtein similarity and rounded. Symmetric, and
/// `token_sort_ratio(a, a) == 100`.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    let score = normalized_levenshtein(&a, &b) * 100.0;
    score.round().clamp(0.0, 100.0) as u8
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(token_sort_ratio("MARIA GARCIA", "MARIA GARCIA"), 100);
    }

    #[test]
    fn word_order_does_not_matter() {
        assert_eq!(token_sort_ratio("JOHN SMITH", "SMITH JOHN"), 100);
        assert_eq!(token_sort_ratio("JOHN  SMITH", " SMITH JOHN "), 100);
    }

    #[test]
    fn disjoint_strings_score_low() {
        assert_eq!(token_sort_ratio("AAAA", "ZZZZ"), 0);
    }

    #[test]
    fn one_edit_in_ten_chars() {
        let s = token_sort_ratio("JOHN SMITH", "JOHN SMYTH");
        assert_eq!(s, 90);
    }

    proptest! {
        #[test]
        fn symmetric_and_bounded(a in "[A-Z ]{0,20}", b in "[A-Z ]{0,20}") {
            let ab = token_sort_ratio(&a, &b);
            prop_assert_eq!(ab, token_sort_ratio(&b, &a));
            prop_assert!(ab <= 100);
        }

        #[test]
        fn self_similarity_is_100(a in "[A-Z -]{0,30}") {
            prop_assert_eq!(token_sort_ratio(&a, &a), 100);
        }
    }
}
