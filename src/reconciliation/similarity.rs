//! Comparison primitives shared by the reconciler and the candidate scorer

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Shortest word that counts towards similarity; "the", "ltd" and friends do not
const MIN_TOKEN_CHARS: usize = 4;

/// Whole days between two dates, always non-negative
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// True when both amounts sit on the same side of zero
pub fn same_sign(a: &BigDecimal, b: &BigDecimal) -> bool {
    let zero = BigDecimal::from(0);
    a.cmp(&zero) == b.cmp(&zero)
}

/// Absolute difference between two amounts
pub fn amount_gap(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a - b).abs()
}

/// Jaccard similarity of the significant words in two descriptions.
///
/// Words are split on whitespace and compared case-insensitively; words of
/// three characters or fewer are dropped. Returns 0.0 when neither side has
/// any significant word.
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let left = significant_tokens(a);
    let right = significant_tokens(b);

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

fn significant_tokens(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
        .map(|word| word.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_between_is_symmetric() {
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 1, 4)), 3);
        assert_eq!(days_between(date(2024, 1, 4), date(2024, 1, 1)), 3);
        assert_eq!(days_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_same_sign() {
        assert!(same_sign(&BigDecimal::from(10), &BigDecimal::from(3)));
        assert!(same_sign(&BigDecimal::from(-10), &BigDecimal::from(-3)));
        assert!(!same_sign(&BigDecimal::from(10), &BigDecimal::from(-3)));
        assert!(!same_sign(&BigDecimal::from(0), &BigDecimal::from(3)));
        assert!(same_sign(&BigDecimal::from(0), &BigDecimal::from(0)));
    }

    #[test]
    fn test_identical_descriptions() {
        let similarity = description_similarity("Office rent March", "office RENT march");
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn test_short_words_are_ignored() {
        // Only "payment" survives on both sides
        let similarity = description_similarity("payment to ABC", "payment for XYZ");
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        // {amazon, marketplace, order} vs {amazon, order, refund}: 2 / 4
        let similarity =
            description_similarity("Amazon marketplace order", "amazon order refund");
        assert!((similarity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_token_sets() {
        assert_eq!(description_similarity("", ""), 0.0);
        assert_eq!(description_similarity("a b c", "to of"), 0.0);
        assert_eq!(description_similarity("", "electricity bill"), 0.0);
    }
}
